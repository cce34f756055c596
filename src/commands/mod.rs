//! Per-page command handlers.
//!
//! Every handler enters its page through the route guard before touching
//! the network, then prints its result as JSON on stdout.

use std::sync::Arc;

use anyhow::bail;
use serde::Serialize;
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::Session;
use crate::cli::Command;
use crate::config::AppConfig;
use crate::routes::{guard, Route, RouteDecision};
use crate::storage::open_store;

mod auth;
mod kitchen;
mod live;
mod menu;
mod orders;
mod people;
mod reports;
mod reservations;
mod tables;
mod waiter;

pub(crate) struct Ctx {
    pub cfg: AppConfig,
    pub session: Arc<Session>,
    pub api: Arc<ApiClient>,
}

impl Ctx {
    fn new(cfg: AppConfig) -> anyhow::Result<Self> {
        let session = Session::new(open_store(&cfg));
        let api = Arc::new(ApiClient::new(&cfg, session.clone())?);
        Ok(Self { cfg, session, api })
    }

    /// Route guard for the page a command belongs to.
    pub fn enter(&self, route: Route) -> anyhow::Result<()> {
        match guard(route, &self.session) {
            RouteDecision::Allow => {
                debug!(route = route.path(), "route allowed");
                Ok(())
            }
            RouteDecision::RedirectLogin => {
                bail!("not signed in; run `resto-admin login` first")
            }
            RouteDecision::RedirectDefault => {
                bail!("{} is not available to your role", route.path())
            }
        }
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn dispatch(command: Command, cfg: AppConfig) -> anyhow::Result<()> {
    let ctx = Ctx::new(cfg)?;
    match command {
        Command::Login { username, password } => auth::login(&ctx, &username, password).await,
        Command::Logout => auth::logout(&ctx),
        Command::Whoami => auth::whoami(&ctx),
        Command::Nav => auth::nav(&ctx),
        Command::Tables(cmd) => tables::run(&ctx, cmd).await,
        Command::Reservations(cmd) => reservations::run(&ctx, cmd).await,
        Command::Orders(cmd) => orders::run(&ctx, cmd).await,
        Command::Billing(cmd) => orders::billing(&ctx, cmd).await,
        Command::Kitchen(cmd) => kitchen::run(&ctx, cmd).await,
        Command::Menu(cmd) => menu::run(&ctx, cmd).await,
        Command::Employees(cmd) => people::run(&ctx, cmd).await,
        Command::Waiter(cmd) => waiter::run(&ctx, cmd).await,
        Command::Reports { text } => reports::run(&ctx, text).await,
        Command::Live { count } => live::run(&ctx, count).await,
    }
}
