//! Static authorization table: which roles may call which route.
//!
//! First matching rule wins; unlisted routes require authentication.

use axum::http::Method;

use atelier_auth::{Access, Role};

use crate::pattern::RoutePattern;

const ADMIN: &[Role] = &[Role::Admin];
const MANAGERS: &[Role] = &[Role::Admin, Role::ChefDeProjet];
const DELIVERY: &[Role] = &[Role::Admin, Role::ChefDeProjet, Role::Developpeur];

/// HTTP methods a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum On {
    Any,
    Get,
    Post,
}

impl On {
    fn accepts(self, method: &Method) -> bool {
        match self {
            On::Any => true,
            On::Get => *method == Method::GET || *method == Method::HEAD,
            On::Post => *method == Method::POST,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub on: On,
    pub pattern: RoutePattern,
    pub access: Access,
}

const fn rule(on: On, pattern: RoutePattern, access: Access) -> RouteRule {
    RouteRule { on, pattern, access }
}

use RoutePattern::{Exact, Subtree};

pub const ROUTE_TABLE: &[RouteRule] = &[
    rule(On::Any, Exact("/health"), Access::Public),
    rule(On::Post, Exact("/api/auth/login"), Access::Public),
    rule(On::Any, Subtree("/api/auth"), Access::Authenticated),
    rule(On::Get, Exact("/api/maintenance/status"), Access::Public),
    rule(On::Any, Subtree("/api/maintenance"), Access::Roles(ADMIN)),
    rule(On::Post, Exact("/api/contact"), Access::Public),
    rule(On::Get, Subtree("/api/public"), Access::Public),
    rule(On::Any, Subtree("/api/users"), Access::Roles(ADMIN)),
    rule(On::Any, Subtree("/api/analytics"), Access::Roles(MANAGERS)),
    rule(On::Get, Subtree("/api/projects"), Access::Authenticated),
    rule(On::Any, Subtree("/api/projects"), Access::Roles(MANAGERS)),
    rule(On::Any, Subtree("/api/tasks"), Access::Roles(DELIVERY)),
];

pub fn required_access(method: &Method, path: &str) -> Access {
    ROUTE_TABLE
        .iter()
        .find(|r| r.on.accepts(method) && r.pattern.matches(path))
        .map(|r| r.access)
        .unwrap_or(Access::Authenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_is_public_but_the_rest_of_auth_is_not() {
        assert_eq!(required_access(&Method::POST, "/api/auth/login"), Access::Public);
        assert_eq!(required_access(&Method::POST, "/api/auth/logout"), Access::Authenticated);
        assert_eq!(required_access(&Method::GET, "/api/auth/login"), Access::Authenticated);
    }

    #[test]
    fn maintenance_writes_are_admin_only() {
        assert_eq!(required_access(&Method::GET, "/api/maintenance/status"), Access::Public);
        assert_eq!(required_access(&Method::POST, "/api/maintenance/toggle"), Access::Roles(ADMIN));
        assert_eq!(
            required_access(&Method::POST, "/api/maintenance/disable"),
            Access::Roles(ADMIN)
        );
    }

    #[test]
    fn project_reads_are_open_to_any_authenticated_role() {
        assert_eq!(required_access(&Method::GET, "/api/projects/3"), Access::Authenticated);
        assert_eq!(required_access(&Method::POST, "/api/projects"), Access::Roles(MANAGERS));
    }

    #[test]
    fn head_follows_the_get_rules() {
        assert_eq!(required_access(&Method::HEAD, "/api/maintenance/status"), Access::Public);
        assert_eq!(required_access(&Method::HEAD, "/api/public/projects/1"), Access::Public);
        assert_eq!(required_access(&Method::HEAD, "/api/projects"), Access::Authenticated);
    }

    #[test]
    fn unlisted_routes_require_authentication() {
        assert_eq!(required_access(&Method::GET, "/api/unknown"), Access::Authenticated);
        assert_eq!(required_access(&Method::DELETE, "/api/contact"), Access::Authenticated);
    }
}
