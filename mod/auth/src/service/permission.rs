use crate::service::{AuthError, AuthService};

impl AuthService {
    /// The union of permission names across all of the user's roles.
    pub fn user_permissions(&self, user_id: &str) -> Result<Vec<String>, AuthError> {
        Ok(self.store.user_permissions(user_id)?)
    }

    /// Check that the user holds at least one of `required` (logical OR).
    ///
    /// An unknown user id is treated as unauthenticated, not forbidden —
    /// the token it came from no longer maps to an account.
    pub fn check_permissions(&self, user_id: &str, required: &[&str]) -> Result<(), AuthError> {
        if self.store.find_user_by_id(user_id)?.is_none() {
            return Err(AuthError::Unauthorized("user not found".to_string()));
        }

        let held = self.store.user_permissions(user_id)?;
        let allowed = required.iter().any(|r| held.iter().any(|h| h == r));
        if allowed {
            Ok(())
        } else {
            Err(AuthError::Forbidden("forbidden".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::CreateUser;
    use crate::service::role::ADMIN_ROLE_NAME;
    use crate::service::testing::test_service;
    use crate::service::AuthError;

    #[test]
    fn test_check_permissions_union_or() {
        let svc = test_service();
        svc.ensure_default_roles().unwrap();

        let user = svc
            .register_user(CreateUser {
                name: "Frank".to_string(),
                email: "frank@example.com".to_string(),
                password: "pw".to_string(),
                avatar: None,
            })
            .unwrap();

        // Default role holds READ only.
        svc.check_permissions(&user.id, &["READ"]).unwrap();
        // OR semantics: one match out of several required is enough.
        svc.check_permissions(&user.id, &["WRITE", "READ"]).unwrap();

        let err = svc.check_permissions(&user.id, &["WRITE"]).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));

        // Add the admin role; WRITE now passes.
        let admin = svc.store.find_role_by_name(ADMIN_ROLE_NAME).unwrap().unwrap();
        svc.store.create_user_role_link(&user.id, &admin.id).unwrap();
        svc.check_permissions(&user.id, &["WRITE"]).unwrap();
    }

    #[test]
    fn test_check_permissions_unknown_user_is_unauthorized() {
        let svc = test_service();
        let err = svc.check_permissions("ghost", &["READ"]).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }
}
