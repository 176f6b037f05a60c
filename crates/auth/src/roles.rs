use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role carried in a credential.
///
/// The set is closed: every match over `Role` is exhaustive, and a token
/// naming any other role fails to decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    ChefDeProjet,
    Developpeur,
    Client,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::ChefDeProjet, Role::Developpeur, Role::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::ChefDeProjet => "CHEF_DE_PROJET",
            Role::Developpeur => "DEVELOPPEUR",
            Role::Client => "CLIENT",
        }
    }

    /// Admins bypass the maintenance window.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
