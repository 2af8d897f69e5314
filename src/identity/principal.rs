use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::token::Claims;

/// Coarse permission label stored on a user record. A missing or unrecognised
/// value means the user holds no role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Host,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Host => "host",
        }
    }

    /// Exact, case-sensitive match against the stored label.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "host" => Some(Role::Host),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller identity decoded from a verified token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Self { email: c.email }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_exact() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("host"), Some(Role::Host));
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse("none"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Host).unwrap(), "\"host\"");
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
