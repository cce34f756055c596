//! Route allow-lists, the route guard, and role-gated navigation.
//!
//! Hiding links and refusing routes is advisory; the backend is the real
//! boundary.

use serde::Serialize;

use crate::auth::{has_any_role, Session, ROLE_ADMIN, ROLE_CHEF, ROLE_WAITER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Home,
    Tables,
    Reservations,
    Menu,
    Orders,
    Kitchen,
    Waiter,
    Employees,
    Reports,
}

/// Menu order of the navigation sidebar.
pub const NAVIGATION_ORDER: &[Route] = &[
    Route::Home,
    Route::Tables,
    Route::Reservations,
    Route::Menu,
    Route::Orders,
    Route::Kitchen,
    Route::Waiter,
    Route::Employees,
    Route::Reports,
];

pub const DEFAULT_ROUTE: Route = Route::Home;

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Home => "/",
            Self::Tables => "/tables",
            Self::Reservations => "/reservations",
            Self::Menu => "/menu",
            Self::Orders => "/orders",
            Self::Kitchen => "/kitchen",
            Self::Waiter => "/waiter",
            Self::Employees => "/employees",
            Self::Reports => "/reports",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Home => "Home",
            Self::Tables => "Tables",
            Self::Reservations => "Reservations",
            Self::Menu => "Menu",
            Self::Orders => "Orders",
            Self::Kitchen => "Kitchen",
            Self::Waiter => "Waiter",
            Self::Employees => "Employees",
            Self::Reports => "Reports",
        }
    }

    /// Roles admitted to this route. Empty means public.
    pub fn allowed_roles(&self) -> &'static [&'static str] {
        match self {
            Self::Login => &[],
            Self::Home
            | Self::Tables
            | Self::Menu
            | Self::Orders
            | Self::Employees
            | Self::Reports => &[ROLE_ADMIN],
            Self::Kitchen => &[ROLE_CHEF, ROLE_ADMIN],
            Self::Reservations | Self::Waiter => &[ROLE_WAITER, ROLE_ADMIN],
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        NAVIGATION_ORDER
            .iter()
            .chain(std::iter::once(&Route::Login))
            .copied()
            .find(|r| r.path() == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    RedirectLogin,
    RedirectDefault,
}

/// Decide a route entry from the token presence and the roles it carries.
pub fn decide(route: Route, token_present: bool, user_roles: &[String]) -> RouteDecision {
    let allowed = route.allowed_roles();
    if allowed.is_empty() {
        return RouteDecision::Allow;
    }
    if !token_present {
        return RouteDecision::RedirectLogin;
    }
    if has_any_role(user_roles, allowed) {
        RouteDecision::Allow
    } else {
        RouteDecision::RedirectDefault
    }
}

/// Guard evaluated on every route entry.
pub fn guard(route: Route, session: &Session) -> RouteDecision {
    match session.token() {
        Some(_) => decide(route, true, &session.roles()),
        None => decide(route, false, &[]),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NavLink {
    pub route: Route,
    pub path: &'static str,
    pub label: &'static str,
}

/// Links visible to a user holding `user_roles`.
pub fn navigation(user_roles: &[String]) -> Vec<NavLink> {
    NAVIGATION_ORDER
        .iter()
        .filter(|r| has_any_role(user_roles, r.allowed_roles()))
        .map(|r| NavLink {
            route: *r,
            path: r.path(),
            label: r.label(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tests::token_with;
    use crate::storage::MemoryTokenStore;

    fn roles(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn admin_only_route_redirects_waiter_to_default() {
        assert_eq!(
            decide(Route::Employees, true, &roles(&[ROLE_WAITER])),
            RouteDecision::RedirectDefault
        );
        assert_eq!(
            decide(Route::Home, true, &roles(&[ROLE_WAITER])),
            RouteDecision::RedirectDefault
        );
    }

    #[test]
    fn shared_route_admits_waiter() {
        assert_eq!(
            decide(Route::Reservations, true, &roles(&[ROLE_WAITER])),
            RouteDecision::Allow
        );
        assert_eq!(
            decide(Route::Kitchen, true, &roles(&[ROLE_CHEF])),
            RouteDecision::Allow
        );
        assert_eq!(
            decide(Route::Kitchen, true, &roles(&[ROLE_WAITER])),
            RouteDecision::RedirectDefault
        );
    }

    #[test]
    fn missing_token_redirects_to_login_but_login_is_public() {
        assert_eq!(decide(Route::Waiter, false, &[]), RouteDecision::RedirectLogin);
        assert_eq!(decide(Route::Login, false, &[]), RouteDecision::Allow);
    }

    #[test]
    fn guard_reads_roles_from_the_session_token() {
        let token = token_with(serde_json::json!({ "roles": ["ROLE_WAITER"] }));
        let session = Session::new(Box::new(MemoryTokenStore::with_token(&token)));
        assert_eq!(guard(Route::Waiter, &session), RouteDecision::Allow);
        assert_eq!(guard(Route::Reports, &session), RouteDecision::RedirectDefault);

        session.invalidate();
        assert_eq!(guard(Route::Waiter, &session), RouteDecision::RedirectLogin);
    }

    #[test]
    fn undefined_token_counts_as_no_session() {
        let session = Session::new(Box::new(MemoryTokenStore::with_token("undefined")));
        assert_eq!(guard(Route::Tables, &session), RouteDecision::RedirectLogin);
    }

    #[test]
    fn navigation_follows_role_sets() {
        let chef: Vec<_> = navigation(&roles(&[ROLE_CHEF]))
            .into_iter()
            .map(|l| l.route)
            .collect();
        assert_eq!(chef, vec![Route::Kitchen]);

        let waiter: Vec<_> = navigation(&roles(&[ROLE_WAITER]))
            .into_iter()
            .map(|l| l.path)
            .collect();
        assert_eq!(waiter, vec!["/reservations", "/waiter"]);

        assert_eq!(navigation(&roles(&[ROLE_ADMIN])).len(), NAVIGATION_ORDER.len());
        assert!(navigation(&[]).is_empty());
    }

    #[test]
    fn paths_round_trip() {
        assert_eq!(Route::from_path("/kitchen/"), Some(Route::Kitchen));
        assert_eq!(Route::from_path("/"), Some(Route::Home));
        assert_eq!(Route::from_path("/login"), Some(Route::Login));
        assert_eq!(Route::from_path("/nowhere"), None);
    }
}
