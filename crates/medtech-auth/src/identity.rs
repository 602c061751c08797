//! Authenticated identity and role gating
//!
//! The identity travels with the access token from login/refresh responses
//! and is all the UI layer needs for route decisions: route guards are a
//! predicate over the role, nothing more.

use serde::{Deserialize, Serialize};

/// Clinic staff role carried in the session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Reception,
    User,
}

impl Role {
    /// Role label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Reception => "reception",
            Role::User => "user",
        }
    }

    /// Route a freshly authenticated session lands on. Plain users have no
    /// console of their own and land back on the unauthenticated entry point.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Doctor => "/doctor",
            Role::Reception => "/reception",
            Role::User => "/login",
        }
    }
}

/// Who the current access token was issued to.
///
/// The server sends more profile fields than these; unknown fields are
/// ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Identity {
    /// Route-guard predicate: may this identity enter a view restricted to
    /// `allowed` roles?
    pub fn permitted(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Identity {
        Identity {
            id: "u-17".into(),
            email: "gregory@clinic.example".into(),
            role: Role::Doctor,
            first_name: Some("Gregory".into()),
            last_name: None,
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Reception).unwrap(), "\"reception\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed: Result<Role, _> = serde_json::from_str("\"superuser\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn identity_tolerates_extra_profile_fields() {
        let json = r#"{
            "id": "u-1",
            "email": "a@clinic.example",
            "role": "reception",
            "status": "active",
            "phone": "+100000000",
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.role, Role::Reception);
        assert!(identity.first_name.is_none());
    }

    #[test]
    fn permitted_checks_membership() {
        let identity = doctor();
        assert!(identity.permitted(&[Role::Admin, Role::Doctor]));
        assert!(!identity.permitted(&[Role::Admin]));
        assert!(!identity.permitted(&[]));
    }

    #[test]
    fn landing_paths_match_console_routes() {
        assert_eq!(Role::Admin.landing_path(), "/admin");
        assert_eq!(Role::Doctor.landing_path(), "/doctor");
        assert_eq!(Role::Reception.landing_path(), "/reception");
        assert_eq!(Role::User.landing_path(), "/login");
    }
}
