use crate::model::{Permission, Role};
use crate::service::{AuthError, AuthService};
use crate::util::new_id;

/// Role linked to every newly registered user.
pub const DEFAULT_ROLE_NAME: &str = "user";

/// Role for administrators.
pub const ADMIN_ROLE_NAME: &str = "admin";

/// Permission required to assign roles to users.
pub const PERM_ASSIGN_ROLES: &str = "admin:assign_roles";

impl AuthService {
    /// Ensure the default roles and permissions exist, creating any that
    /// are missing. Safe to call on every startup.
    ///
    /// Seeds `admin` (READ, WRITE, admin:assign_roles) and `user` (READ).
    pub fn ensure_default_roles(&self) -> Result<(), AuthError> {
        let read = self.ensure_permission("READ", "Read access")?;
        let write = self.ensure_permission("WRITE", "Write access")?;
        let assign = self.ensure_permission(PERM_ASSIGN_ROLES, "Assign roles to users")?;

        let admin = self.ensure_role(
            ADMIN_ROLE_NAME,
            "Administrator role with full permissions",
        )?;
        let user = self.ensure_role(DEFAULT_ROLE_NAME, "Regular user role")?;

        self.store.link_role_permission(&admin.id, &read.id)?;
        self.store.link_role_permission(&admin.id, &write.id)?;
        self.store.link_role_permission(&admin.id, &assign.id)?;
        self.store.link_role_permission(&user.id, &read.id)?;

        Ok(())
    }

    /// Assign a role to a user. The acting user must hold the
    /// `admin:assign_roles` permission.
    pub fn assign_role(
        &self,
        actor_id: &str,
        user_id: &str,
        role_name: &str,
    ) -> Result<(), AuthError> {
        let actor_perms = self.store.user_permissions(actor_id)?;
        if !actor_perms.iter().any(|p| p == PERM_ASSIGN_ROLES) {
            return Err(AuthError::Forbidden("forbidden".to_string()));
        }

        self.store
            .find_user_by_id(user_id)?
            .ok_or_else(|| AuthError::NotFound(format!("users/{}", user_id)))?;
        let role = self
            .store
            .find_role_by_name(role_name)?
            .ok_or_else(|| AuthError::NotFound(format!("roles/{}", role_name)))?;

        self.store.create_user_role_link(user_id, &role.id)?;
        Ok(())
    }

    fn ensure_role(&self, name: &str, description: &str) -> Result<Role, AuthError> {
        if let Some(role) = self.store.find_role_by_name(name)? {
            return Ok(role);
        }
        let role = Role {
            id: new_id(),
            name: name.to_string(),
            description: Some(description.to_string()),
        };
        self.store.create_role(&role)?;
        Ok(role)
    }

    fn ensure_permission(&self, name: &str, description: &str) -> Result<Permission, AuthError> {
        if let Some(permission) = self.store.find_permission_by_name(name)? {
            return Ok(permission);
        }
        let permission = Permission {
            id: new_id(),
            name: name.to_string(),
            description: Some(description.to_string()),
        };
        self.store.create_permission(&permission)?;
        Ok(permission)
    }
}
