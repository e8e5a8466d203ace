use std::collections::{HashMap, HashSet};

/// A mock authorization info database.
///
/// Internally it's just a HashMap of user->role and one of role->permissions. In a real
/// deployment this would be a lookup against an identity provider.
#[derive(Clone, Debug)]
pub struct AuthzDb {
    user_database: HashMap<String, Role>,
    role_permissions: HashMap<Role, HashSet<Permission>>,
}

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug)]
pub enum Permission {
    /// read job records
    Query,
    /// create, start and stop jobs
    StartOrStop,
}

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug)]
enum Role {
    ReadOnly,
    ReadWrite,
}

impl Default for AuthzDb {
    fn default() -> Self {
        let mut mock_user_db = HashMap::new();

        // "reader" may only look at jobs
        mock_user_db.insert("reader".to_string(), Role::ReadOnly);

        // "writer" may do everything
        mock_user_db.insert("writer".to_string(), Role::ReadWrite);

        let mut role_permissions = HashMap::new();
        role_permissions.insert(Role::ReadOnly, HashSet::from([Permission::Query]));
        role_permissions.insert(
            Role::ReadWrite,
            HashSet::from([Permission::Query, Permission::StartOrStop]),
        );

        Self {
            user_database: mock_user_db,
            role_permissions,
        }
    }
}

impl AuthzDb {
    pub fn knows(&self, user_id: &str) -> bool {
        self.user_database.contains_key(user_id)
    }

    pub fn has_permission(&self, user_id: &str, permission: Permission) -> bool {
        self.user_database
            .get(user_id)
            .and_then(|role| self.role_permissions.get(role))
            .map(|permissions| permissions.contains(&permission))
            .unwrap_or(false)
    }
}
