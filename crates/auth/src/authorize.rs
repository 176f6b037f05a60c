use thiserror::Error;

use crate::{Principal, Role};

/// Access requirement of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, including anonymous callers.
    Public,
    /// Any authenticated principal.
    Authenticated,
    /// An authenticated principal holding one of the listed roles.
    Roles(&'static [Role]),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: role '{0}' may not access this resource")]
    Forbidden(Role),
}

/// Check a (possibly absent) principal against a route requirement.
///
/// - No IO
/// - No panics
/// - Pure policy check: missing identity and wrong role are distinct errors
pub fn authorize(principal: Option<&Principal>, required: &Access) -> Result<(), AuthzError> {
    match (required, principal) {
        (Access::Public, _) => Ok(()),
        (_, None) => Err(AuthzError::Unauthenticated),
        (Access::Authenticated, Some(_)) => Ok(()),
        (Access::Roles(roles), Some(p)) => {
            if roles.contains(&p.role) {
                Ok(())
            } else {
                Err(AuthzError::Forbidden(p.role))
            }
        }
    }
}
