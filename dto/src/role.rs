use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Admin,
    Org,
}

#[derive(Debug, Snafu)]
#[snafu(display("Invalid role: {role}"))]
pub struct InvalidRoleError {
    role: String,
}

impl TryFrom<&str> for Role {
    type Error = InvalidRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "admin" | "superadmin" => Ok(Role::Admin),
            "org" | "organization" | "user" => Ok(Role::Org),
            _ => InvalidRoleSnafu { role: value }.fail(),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = InvalidRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Org => write!(f, "org"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_valid() {
        assert_eq!(Role::try_from("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::try_from("organization").unwrap(), Role::Org);
    }

    #[test]
    fn test_role_invalid() {
        let role = Role::try_from("NetflixRole");
        assert!(role.is_err());
        if let Err(e) = role {
            assert_eq!(e.to_string(), "Invalid role: NetflixRole");
        }
    }
}
