use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

/// Admins carry the barbershop they run; schedulers only book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Role {
    #[serde(rename_all = "camelCase")]
    Admin {
        barbershop_name: Option<String>,
        address: Option<String>,
    },
    Scheduler,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin { .. } => "admin",
            Role::Scheduler => "scheduler",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_as_tagged_variant() {
        let admin = Role::Admin {
            barbershop_name: Some("Fade Factory".to_string()),
            address: None,
        };
        let json = serde_json::to_value(&admin).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["barbershopName"], "Fade Factory");

        let scheduler = serde_json::to_value(Role::Scheduler).unwrap();
        assert_eq!(scheduler, serde_json::json!({"role": "scheduler"}));
    }

    #[test]
    fn test_role_deserializes_from_tag() {
        let role: Role = serde_json::from_str(r#"{"role":"admin","address":"1 Main St"}"#).unwrap();
        assert_eq!(
            role,
            Role::Admin {
                barbershop_name: None,
                address: Some("1 Main St".to_string()),
            }
        );
        assert!(role.is_admin());
    }
}
