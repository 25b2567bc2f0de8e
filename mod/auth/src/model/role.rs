use serde::{Deserialize, Serialize};

/// A role grouping a set of permissions. Users are linked to roles through
/// the `user_roles` join table; permissions through `role_permissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Unique role name (e.g. "admin", "user").
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named permission (e.g. "READ", "WRITE", "admin:assign_roles").
/// Auth stores and queries these but does not interpret their semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Unique permission name.
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
