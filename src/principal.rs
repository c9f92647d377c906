use serde::{Deserialize, Serialize};

pub const ADMINISTRATOR: &str = "administrator";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Role {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
        }
    }
}

/// The signed-in studio user. Authentication itself belongs to the platform.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Principal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            name: None,
            roles: roles.into_iter().map(Role::named).collect(),
        }
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }
}

/// Role check that tolerates a missing principal (nobody signed in).
pub fn has_role(principal: Option<&Principal>, name: &str) -> bool {
    principal.is_some_and(|p| p.has_role(name))
}

pub fn is_administrator(principal: Option<&Principal>) -> bool {
    has_role(principal, ADMINISTRATOR)
}
