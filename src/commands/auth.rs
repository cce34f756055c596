use serde_json::json;
use zeroize::Zeroizing;

use super::{print_json, Ctx};
use crate::auth::{self, subject_and_expiry};
use crate::routes::navigation;

pub(super) async fn login(ctx: &Ctx, username: &str, password: String) -> anyhow::Result<()> {
    let password = Zeroizing::new(password);
    let roles = auth::login(ctx.api.as_ref(), &ctx.session, username, &password).await?;
    print_json(&json!({
        "authenticated": true,
        "roles": roles,
        "navigation": navigation(&roles),
    }))
}

pub(super) fn logout(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.session.logout()?;
    print_json(&json!({ "authenticated": false }))
}

pub(super) fn whoami(ctx: &Ctx) -> anyhow::Result<()> {
    let Some(token) = ctx.session.token() else {
        return print_json(&json!({ "authenticated": false }));
    };
    let (subject, expires_at) = subject_and_expiry(&token);
    print_json(&json!({
        "authenticated": true,
        "subject": subject,
        "expiresAt": expires_at,
        "roles": ctx.session.roles(),
    }))
}

pub(super) fn nav(ctx: &Ctx) -> anyhow::Result<()> {
    print_json(&navigation(&ctx.session.roles()))
}
