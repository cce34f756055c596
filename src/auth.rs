//! Bearer-token sessions and role claims.
//!
//! The token is opaque to the backend contract except for its payload
//! segment, which we decode (without verifying the signature) to learn the
//! role names used for route gating and navigation. The decoded roles are a
//! convenience for the UI only; the backend remains the authority.
//!
//! A [`Session`] is created once per process and passed explicitly to the
//! components that need it. It owns the token store and the lazily opened
//! live-update channel, both of which are torn down by [`Session::logout`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::live::LiveChannel;
use crate::models::LoginResponse;
use crate::storage::TokenStore;

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_WAITER: &str = "ROLE_WAITER";
pub const ROLE_CHEF: &str = "ROLE_CHEF";

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim().trim_end_matches('=');
    if let Ok(bytes) = URL_SAFE_NO_PAD.decode(trimmed) {
        return Some(bytes);
    }
    // Some issuers emit the standard alphabet; normalise and pad.
    let standard = trimmed.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        standard,
        "=".repeat((4usize.wrapping_sub(standard.len() % 4)) % 4)
    );
    STANDARD.decode(padded).ok()
}

/// Decode the payload segment of a bearer token. Anything undecodable
/// yields an empty object.
pub fn decode_claims(token: &str) -> Value {
    let empty = || Value::Object(serde_json::Map::new());
    let mut parts = token.split('.');
    let (Some(_header), Some(payload)) = (parts.next(), parts.next()) else {
        return empty();
    };
    decode_segment(payload)
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .filter(Value::is_object)
        .unwrap_or_else(empty)
}

fn role_name(entry: &Value) -> Option<String> {
    let raw = match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map
            .get("authority")
            .or_else(|| map.get("name"))
            .and_then(Value::as_str),
        _ => None,
    }?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Role names carried by decoded claims: `roles`, else `authorities`, else a
/// single `role`.
pub fn roles_from_claims(claims: &Value) -> Vec<String> {
    if let Some(list) = claims.get("roles").and_then(Value::as_array) {
        return list.iter().filter_map(role_name).collect();
    }
    if let Some(list) = claims.get("authorities").and_then(Value::as_array) {
        return list.iter().filter_map(role_name).collect();
    }
    claims
        .get("role")
        .and_then(role_name)
        .map(|r| vec![r])
        .unwrap_or_default()
}

pub fn roles_from_token(token: &str) -> Vec<String> {
    roles_from_claims(&decode_claims(token))
}

/// True when the user's roles intersect the allow-list.
pub fn has_any_role(user_roles: &[String], allowed: &[&str]) -> bool {
    allowed
        .iter()
        .any(|wanted| user_roles.iter().any(|r| r == wanted))
}

/// Subject and expiry for display; never used for gating.
pub fn subject_and_expiry(token: &str) -> (Option<String>, Option<DateTime<Utc>>) {
    let claims = decode_claims(token);
    let subject = claims
        .get("sub")
        .and_then(Value::as_str)
        .map(str::to_string);
    let expiry = claims
        .get("exp")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    (subject, expiry)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    store: Box<dyn TokenStore>,
    live: Mutex<Option<LiveChannel>>,
}

impl Session {
    pub fn new(store: Box<dyn TokenStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            live: Mutex::new(None),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.store.load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn roles(&self) -> Vec<String> {
        self.token()
            .map(|t| roles_from_token(&t))
            .unwrap_or_default()
    }

    pub fn has_any_role(&self, allowed: &[&str]) -> bool {
        has_any_role(&self.roles(), allowed)
    }

    /// Start a session with a freshly issued token.
    pub fn begin(&self, token: &str) -> DashboardResult<()> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(DashboardError::validation("Login failed: no token in response"));
        }
        self.store.save(trimmed)?;
        let roles = roles_from_token(trimmed);
        info!(roles = ?roles, "session started");
        Ok(())
    }

    /// Drop the stored token after the backend rejected it.
    pub fn invalidate(&self) {
        warn!("backend rejected the session token, clearing it");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear rejected session token");
        }
    }

    /// End the session: close the live channel and forget the token.
    ///
    /// `Session` keeps no copy of the token; the store's `clear` is what
    /// wipes it, and the in-memory store zeroizes the string it drops.
    pub fn logout(&self) -> DashboardResult<()> {
        self.close_live();
        self.store.clear()?;
        info!("session ended");
        Ok(())
    }

    pub(crate) fn live_slot(&self) -> &Mutex<Option<LiveChannel>> {
        &self.live
    }

    pub fn close_live(&self) {
        let channel = match self.live.lock() {
            Ok(mut guard) => guard.take(),
            Err(e) => {
                warn!("live channel lock poisoned: {e}");
                None
            }
        };
        if let Some(channel) = channel {
            channel.close();
        }
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> DashboardResult<LoginResponse>;
}

/// Exchange credentials for a token and start the session with it.
pub async fn login<A: AuthApi + ?Sized>(
    api: &A,
    session: &Session,
    username: &str,
    password: &str,
) -> DashboardResult<Vec<String>> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DashboardError::validation("username required"));
    }
    info!(username = %username, "logging in");
    let response = api.login(username, password).await?;
    let token = response
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| DashboardError::validation("Login failed: no token in response"))?;
    session.begin(&token)?;
    Ok(roles_from_token(&token))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;

    /// Unsigned token with the given JSON payload.
    pub(crate) fn token_with(payload: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn roles_claim_takes_precedence() {
        let token = token_with(serde_json::json!({
            "sub": "admin",
            "roles": ["ROLE_ADMIN"],
            "authorities": ["ROLE_WAITER"]
        }));
        assert_eq!(roles_from_token(&token), vec!["ROLE_ADMIN"]);
    }

    #[test]
    fn authorities_accept_strings_and_objects() {
        let token = token_with(serde_json::json!({
            "authorities": ["ROLE_CHEF", { "authority": "ROLE_WAITER" }, 42]
        }));
        assert_eq!(roles_from_token(&token), vec!["ROLE_CHEF", "ROLE_WAITER"]);
    }

    #[test]
    fn single_role_claim_is_wrapped() {
        let token = token_with(serde_json::json!({ "role": "ROLE_WAITER" }));
        assert_eq!(roles_from_token(&token), vec!["ROLE_WAITER"]);
    }

    #[test]
    fn garbage_tokens_have_no_roles() {
        assert!(roles_from_token("").is_empty());
        assert!(roles_from_token("not-a-token").is_empty());
        assert!(roles_from_token("a.%%%.c").is_empty());
        let not_object = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"[1,2]"));
        assert!(roles_from_token(&not_object).is_empty());
    }

    #[test]
    fn padded_standard_alphabet_payload_decodes() {
        let payload = STANDARD.encode(br#"{"roles":["ROLE_ADMIN"],"exp":1900000000}"#);
        let token = format!("h.{payload}.s");
        assert_eq!(roles_from_token(&token), vec!["ROLE_ADMIN"]);
        let (_, expiry) = subject_and_expiry(&token);
        assert_eq!(expiry.map(|e| e.timestamp()), Some(1_900_000_000));
    }

    #[test]
    fn session_invalidate_clears_token() {
        let token = token_with(serde_json::json!({ "roles": ["ROLE_ADMIN"] }));
        let session = Session::new(Box::new(MemoryTokenStore::with_token(&token)));
        assert!(session.has_any_role(&[ROLE_ADMIN]));
        session.invalidate();
        assert!(!session.is_authenticated());
        assert!(session.roles().is_empty());
    }

    struct FixedLogin(Option<String>);

    #[async_trait]
    impl AuthApi for FixedLogin {
        async fn login(&self, _u: &str, _p: &str) -> DashboardResult<LoginResponse> {
            Ok(LoginResponse {
                token: self.0.clone(),
            })
        }
    }

    #[tokio::test]
    async fn login_stores_token_and_reports_roles() {
        let session = Session::new(Box::new(MemoryTokenStore::new()));
        let token = token_with(serde_json::json!({ "roles": ["ROLE_CHEF"] }));
        let roles = login(&FixedLogin(Some(token.clone())), &session, "chef", "pw")
            .await
            .expect("login succeeds");
        assert_eq!(roles, vec!["ROLE_CHEF"]);
        assert_eq!(session.token().as_deref(), Some(token.as_str()));

        session.logout().expect("logout");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn login_without_token_in_response_fails() {
        let session = Session::new(Box::new(MemoryTokenStore::new()));
        let err = login(&FixedLogin(None), &session, "admin", "123")
            .await
            .expect_err("missing token should fail");
        assert!(err.user_message().contains("no token"));
        assert!(!session.is_authenticated());
    }
}
