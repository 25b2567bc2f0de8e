use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::model::{Permission, Role, User};
use crate::store::{CredentialStore, StoreError};
use crate::util::now_rfc3339;

/// SqliteStore is a CredentialStore backed by rusqlite (bundled SQLite).
///
/// A single connection behind a mutex serializes access; every trait method
/// is one statement, so the update-with-precondition operations are atomic
/// per row.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

/// Initialize the schema for all auth resources.
fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    let statements = [
        // Users table: core identity plus the token columns the auth
        // state machine lives on.
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT,
            refresh_token TEXT,
            reset_token TEXT,
            reset_token_expires TEXT,
            avatar TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_reset_token ON users(reset_token)",

        // Roles and permissions, many-to-many.
        "CREATE TABLE IF NOT EXISTS roles (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )",
        "CREATE TABLE IF NOT EXISTS permissions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )",
        "CREATE TABLE IF NOT EXISTS role_permissions (
            role_id TEXT NOT NULL,
            permission_id TEXT NOT NULL,
            PRIMARY KEY (role_id, permission_id),
            FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE,
            FOREIGN KEY (permission_id) REFERENCES permissions(id) ON DELETE CASCADE
        )",

        // User-role links, created on registration (default role) and on
        // explicit admin assignment.
        "CREATE TABLE IF NOT EXISTS user_roles (
            user_id TEXT NOT NULL,
            role_id TEXT NOT NULL,
            PRIMARY KEY (user_id, role_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE
        )",
    ];

    for stmt in &statements {
        conn.execute(stmt, [])
            .map_err(|e| StoreError::Query(e.to_string()))?;
    }

    Ok(())
}

/// Classify a rusqlite error: unique-key violations become conflicts.
fn map_err(e: rusqlite::Error) -> StoreError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint") {
        StoreError::Conflict(msg)
    } else {
        StoreError::Query(msg)
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        refresh_token: row.get("refresh_token")?,
        reset_token: row.get("reset_token")?,
        reset_token_expires: row.get("reset_token_expires")?,
        avatar: row.get("avatar")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

const USER_COLUMNS: &str = "id, name, email, password_hash, refresh_token, \
     reset_token, reset_token_expires, avatar, created_at, updated_at";

impl CredentialStore for SqliteStore {
    fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, refresh_token, \
             reset_token, reset_token_expires, avatar, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.id,
                user.name,
                user.email,
                user.password_hash,
                user.refresh_token,
                user.reset_token,
                user.reset_token_expires,
                user.avatar,
                user.created_at,
                user.updated_at,
            ],
        )
        .map_err(map_err)?;
        Ok(())
    }

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(map_err)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(map_err)
    }

    fn find_user_by_reset_token(
        &self,
        token: &str,
        now: &str,
    ) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM users \
                 WHERE reset_token = ?1 AND reset_token_expires > ?2",
                USER_COLUMNS
            ),
            params![token, now],
            user_from_row,
        )
        .optional()
        .map_err(map_err)
    }

    fn set_refresh_token(&self, user_id: &str, token: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE users SET refresh_token = ?1, updated_at = ?2 WHERE id = ?3",
                params![token, now_rfc3339(), user_id],
            )
            .map_err(map_err)?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("users/{}", user_id)));
        }
        Ok(())
    }

    fn rotate_refresh_token(
        &self,
        user_id: &str,
        old: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE users SET refresh_token = ?1, updated_at = ?2 \
                 WHERE id = ?3 AND refresh_token = ?4",
                params![new, now_rfc3339(), user_id, old],
            )
            .map_err(map_err)?;
        Ok(affected == 1)
    }

    fn set_reset_token(
        &self,
        user_id: &str,
        token: &str,
        expires_at: &str,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE users SET reset_token = ?1, reset_token_expires = ?2, \
                 updated_at = ?3 WHERE id = ?4",
                params![token, expires_at, now_rfc3339(), user_id],
            )
            .map_err(map_err)?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("users/{}", user_id)));
        }
        Ok(())
    }

    fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE users SET password_hash = ?1, reset_token = NULL, \
                 reset_token_expires = NULL, updated_at = ?2 \
                 WHERE reset_token = ?3 AND reset_token_expires > ?4",
                params![new_password_hash, now_rfc3339(), token, now],
            )
            .map_err(map_err)?;
        Ok(affected == 1)
    }

    fn create_role(&self, role: &Role) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO roles (id, name, description) VALUES (?1, ?2, ?3)",
            params![role.id, role.name, role.description],
        )
        .map_err(map_err)?;
        Ok(())
    }

    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, description FROM roles WHERE name = ?1",
            params![name],
            |row| {
                Ok(Role {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    description: row.get("description")?,
                })
            },
        )
        .optional()
        .map_err(map_err)
    }

    fn create_permission(&self, permission: &Permission) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO permissions (id, name, description) VALUES (?1, ?2, ?3)",
            params![permission.id, permission.name, permission.description],
        )
        .map_err(map_err)?;
        Ok(())
    }

    fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, description FROM permissions WHERE name = ?1",
            params![name],
            |row| {
                Ok(Permission {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    description: row.get("description")?,
                })
            },
        )
        .optional()
        .map_err(map_err)
    }

    fn link_role_permission(
        &self,
        role_id: &str,
        permission_id: &str,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) \
             VALUES (?1, ?2)",
            params![role_id, permission_id],
        )
        .map_err(map_err)?;
        Ok(())
    }

    fn create_user_role_link(&self, user_id: &str, role_id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
            params![user_id, role_id],
        )
        .map_err(map_err)?;
        Ok(())
    }

    fn user_permissions(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT p.name FROM permissions p \
                 JOIN role_permissions rp ON rp.permission_id = p.id \
                 JOIN user_roles ur ON ur.role_id = rp.role_id \
                 WHERE ur.user_id = ?1 ORDER BY p.name",
            )
            .map_err(map_err)?;

        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .map_err(map_err)?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(map_err)?);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{new_id, rfc3339_after};

    fn test_user(email: &str) -> User {
        let now = now_rfc3339();
        User {
            id: new_id(),
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: Some("hash".to_string()),
            refresh_token: None,
            reset_token: None,
            reset_token_expires: None,
            avatar: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_open_on_disk_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.sqlite");

        let user = test_user("disk@example.com");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_user(&user).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let found = store.find_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(found.email, "disk@example.com");
    }

    #[test]
    fn test_user_lookups() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = test_user("alice@example.com");
        store.create_user(&user).unwrap();

        let by_id = store.find_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");

        let by_email = store.find_user_by_email("alice@example.com").unwrap();
        assert!(by_email.is_some());
        assert!(store.find_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_user(&test_user("dup@example.com")).unwrap();
        let err = store.create_user(&test_user("dup@example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_rotate_refresh_token_precondition() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = test_user("bob@example.com");
        store.create_user(&user).unwrap();

        store.set_refresh_token(&user.id, "r1").unwrap();
        assert!(store.rotate_refresh_token(&user.id, "r1", "r2").unwrap());
        // Stale expected value: no swap.
        assert!(!store.rotate_refresh_token(&user.id, "r1", "r3").unwrap());

        let current = store.find_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(current.refresh_token.as_deref(), Some("r2"));
    }

    #[test]
    fn test_consume_reset_token_is_single_use() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = test_user("carol@example.com");
        store.create_user(&user).unwrap();

        store
            .set_reset_token(&user.id, "tok", &rfc3339_after(3600))
            .unwrap();

        let now = now_rfc3339();
        assert!(store.consume_reset_token("tok", "new-hash", &now).unwrap());
        assert!(!store.consume_reset_token("tok", "other-hash", &now).unwrap());

        let current = store.find_user_by_id(&user.id).unwrap().unwrap();
        assert_eq!(current.password_hash.as_deref(), Some("new-hash"));
        assert!(current.reset_token.is_none());
        assert!(current.reset_token_expires.is_none());
    }

    #[test]
    fn test_expired_reset_token_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = test_user("dave@example.com");
        store.create_user(&user).unwrap();

        store
            .set_reset_token(&user.id, "old-tok", &rfc3339_after(-10))
            .unwrap();

        let now = now_rfc3339();
        assert!(store.find_user_by_reset_token("old-tok", &now).unwrap().is_none());
        assert!(!store.consume_reset_token("old-tok", "hash", &now).unwrap());
    }

    #[test]
    fn test_user_permissions_union() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = test_user("erin@example.com");
        store.create_user(&user).unwrap();

        let admin = Role { id: new_id(), name: "admin".into(), description: None };
        let viewer = Role { id: new_id(), name: "viewer".into(), description: None };
        store.create_role(&admin).unwrap();
        store.create_role(&viewer).unwrap();

        let read = Permission { id: new_id(), name: "READ".into(), description: None };
        let write = Permission { id: new_id(), name: "WRITE".into(), description: None };
        store.create_permission(&read).unwrap();
        store.create_permission(&write).unwrap();

        store.link_role_permission(&admin.id, &read.id).unwrap();
        store.link_role_permission(&admin.id, &write.id).unwrap();
        store.link_role_permission(&viewer.id, &read.id).unwrap();

        store.create_user_role_link(&user.id, &admin.id).unwrap();
        store.create_user_role_link(&user.id, &viewer.id).unwrap();
        // Idempotent.
        store.create_user_role_link(&user.id, &viewer.id).unwrap();

        let perms = store.user_permissions(&user.id).unwrap();
        assert_eq!(perms, vec!["READ".to_string(), "WRITE".to_string()]);
    }
}
