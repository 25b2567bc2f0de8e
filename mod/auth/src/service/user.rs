use crate::model::{CreateUser, User};
use crate::service::{password, role, AuthError, AuthService};
use crate::util::{new_id, now_rfc3339};

impl AuthService {
    /// Register a new user with a password.
    ///
    /// Rejects duplicate emails, hashes the password, and links the default
    /// `user` role when it exists.
    pub fn register_user(&self, input: CreateUser) -> Result<User, AuthError> {
        if self.store.find_user_by_email(&input.email)?.is_some() {
            return Err(AuthError::Conflict("email already in use".to_string()));
        }

        let hash = password::hash_password(&input.password)?;
        let user = self.insert_user(input.name, input.email, hash, input.avatar)?;
        Ok(user)
    }

    /// Get a user by id.
    pub fn get_user(&self, id: &str) -> Result<User, AuthError> {
        self.store
            .find_user_by_id(id)?
            .ok_or_else(|| AuthError::NotFound(format!("users/{}", id)))
    }

    /// Provision an account for a first-time federated login. The row gets
    /// a random hashed password so it satisfies the same invariants as
    /// password-based accounts.
    pub(crate) fn provision_federated_user(
        &self,
        email: &str,
        name: &str,
        picture: Option<String>,
    ) -> Result<User, AuthError> {
        let raw = password::generate_random_password(12);
        let hash = password::hash_password(&raw)?;
        self.insert_user(name.to_string(), email.to_string(), hash, picture)
    }

    fn insert_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
        avatar: Option<String>,
    ) -> Result<User, AuthError> {
        let now = now_rfc3339();
        let user = User {
            id: new_id(),
            name,
            email,
            password_hash: Some(password_hash),
            refresh_token: None,
            reset_token: None,
            reset_token_expires: None,
            avatar,
            created_at: now.clone(),
            updated_at: now,
        };
        self.store.create_user(&user)?;

        match self.store.find_role_by_name(role::DEFAULT_ROLE_NAME)? {
            Some(default_role) => {
                self.store.create_user_role_link(&user.id, &default_role.id)?;
            }
            None => {
                tracing::warn!(
                    email = %user.email,
                    "default '{}' role not found; user created without a role",
                    role::DEFAULT_ROLE_NAME
                );
            }
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::CreateUser;
    use crate::service::testing::test_service;

    fn create(email: &str) -> CreateUser {
        CreateUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "correct".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_register_and_get() {
        let svc = test_service();
        svc.ensure_default_roles().unwrap();

        let user = svc.register_user(create("alice@example.com")).unwrap();
        assert!(user.password_hash.is_some());
        assert_ne!(user.password_hash.as_deref(), Some("correct"));

        let fetched = svc.get_user(&user.id).unwrap();
        assert_eq!(fetched.email, "alice@example.com");

        // Default role grants READ.
        let perms = svc.user_permissions(&user.id).unwrap();
        assert!(perms.contains(&"READ".to_string()));
    }

    #[test]
    fn test_register_duplicate_email_conflicts() {
        let svc = test_service();
        svc.register_user(create("dup@example.com")).unwrap();
        let err = svc.register_user(create("dup@example.com")).unwrap_err();
        assert!(matches!(err, crate::service::AuthError::Conflict(_)));
    }

    #[test]
    fn test_register_without_seeded_roles_still_succeeds() {
        let svc = test_service();
        // No ensure_default_roles: user is created, just roleless.
        let user = svc.register_user(create("lone@example.com")).unwrap();
        assert!(svc.user_permissions(&user.id).unwrap().is_empty());
    }
}
