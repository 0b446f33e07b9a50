//! Role resolution on top of the membership store.

use std::sync::Arc;

use service_core::error::AppError;
use uuid::Uuid;

use crate::middleware::auth::CurrentUser;

use super::store::MembershipQueries;

/// Role booleans for a project-scoped request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRoles {
    pub is_manager: bool,
    pub is_engineer: bool,
    pub is_member: bool,
}

/// Role booleans for a group-scoped request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRoles {
    pub is_member: bool,
    /// Manager of the group's owning project.
    pub is_project_manager: bool,
}

/// Composes membership queries with the global system-admin override.
///
/// Constructed once per process and injected through `AppState`; guards and
/// the permission header middleware share one instance. A system admin
/// resolves to all-true without touching the store.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn MembershipQueries>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn MembershipQueries>) -> Self {
        Self { store }
    }

    pub async fn is_project_manager(
        &self,
        user: &CurrentUser,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        if user.is_system_admin {
            return Ok(true);
        }
        self.store.is_project_manager(project_id, user.id).await
    }

    pub async fn is_project_engineer(
        &self,
        user: &CurrentUser,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        if user.is_system_admin {
            return Ok(true);
        }
        self.store.is_project_engineer(project_id, user.id).await
    }

    pub async fn is_project_member(
        &self,
        user: &CurrentUser,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        if user.is_system_admin {
            return Ok(true);
        }
        self.store.is_project_member(project_id, user.id).await
    }

    pub async fn is_group_member(
        &self,
        user: &CurrentUser,
        group_id: Uuid,
    ) -> Result<bool, AppError> {
        if user.is_system_admin {
            return Ok(true);
        }
        self.store.is_group_member(group_id, user.id).await
    }

    pub async fn is_group_manager(
        &self,
        user: &CurrentUser,
        group_id: Uuid,
    ) -> Result<bool, AppError> {
        if user.is_system_admin {
            return Ok(true);
        }
        self.store.is_group_manager(group_id, user.id).await
    }

    /// All project role booleans at once; the three checks are independent
    /// and issued concurrently.
    pub async fn project_roles(
        &self,
        user: &CurrentUser,
        project_id: Uuid,
    ) -> Result<ProjectRoles, AppError> {
        if user.is_system_admin {
            return Ok(ProjectRoles {
                is_manager: true,
                is_engineer: true,
                is_member: true,
            });
        }
        let (is_manager, is_engineer, is_member) = tokio::join!(
            self.store.is_project_manager(project_id, user.id),
            self.store.is_project_engineer(project_id, user.id),
            self.store.is_project_member(project_id, user.id),
        );
        Ok(ProjectRoles {
            is_manager: is_manager?,
            is_engineer: is_engineer?,
            is_member: is_member?,
        })
    }

    /// Both group role booleans at once, issued concurrently.
    pub async fn group_roles(
        &self,
        user: &CurrentUser,
        group_id: Uuid,
    ) -> Result<GroupRoles, AppError> {
        if user.is_system_admin {
            return Ok(GroupRoles {
                is_member: true,
                is_project_manager: true,
            });
        }
        let (is_member, is_project_manager) = tokio::join!(
            self.store.is_group_member(group_id, user.id),
            self.store.is_group_manager(group_id, user.id),
        );
        Ok(GroupRoles {
            is_member: is_member?,
            is_project_manager: is_project_manager?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake store that counts queries and answers a fixed value.
    struct CountingStore {
        answer: bool,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self) -> Result<bool, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    #[async_trait]
    impl MembershipQueries for CountingStore {
        async fn is_project_manager(&self, _: Uuid, _: Uuid) -> Result<bool, AppError> {
            self.record()
        }
        async fn is_project_engineer(&self, _: Uuid, _: Uuid) -> Result<bool, AppError> {
            self.record()
        }
        async fn is_project_member(&self, _: Uuid, _: Uuid) -> Result<bool, AppError> {
            self.record()
        }
        async fn is_group_member(&self, _: Uuid, _: Uuid) -> Result<bool, AppError> {
            self.record()
        }
        async fn is_group_manager(&self, _: Uuid, _: Uuid) -> Result<bool, AppError> {
            self.record()
        }
    }

    fn user(is_system_admin: bool) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: "user".to_string(),
            is_system_admin,
            is_verified: true,
        }
    }

    #[tokio::test]
    async fn system_admin_short_circuits_every_check_without_queries() {
        let store = Arc::new(CountingStore::new(false));
        let resolver = RoleResolver::new(store.clone());
        let admin = user(true);
        let id = Uuid::new_v4();

        assert!(resolver.is_project_manager(&admin, id).await.unwrap());
        assert!(resolver.is_project_engineer(&admin, id).await.unwrap());
        assert!(resolver.is_project_member(&admin, id).await.unwrap());
        assert!(resolver.is_group_member(&admin, id).await.unwrap());
        assert!(resolver.is_group_manager(&admin, id).await.unwrap());

        let roles = resolver.project_roles(&admin, id).await.unwrap();
        assert_eq!(
            roles,
            ProjectRoles {
                is_manager: true,
                is_engineer: true,
                is_member: true
            }
        );
        let roles = resolver.group_roles(&admin, id).await.unwrap();
        assert_eq!(
            roles,
            GroupRoles {
                is_member: true,
                is_project_manager: true
            }
        );

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn non_admin_delegates_to_the_store() {
        let store = Arc::new(CountingStore::new(true));
        let resolver = RoleResolver::new(store.clone());
        let regular = user(false);
        let id = Uuid::new_v4();

        assert!(resolver.is_project_manager(&regular, id).await.unwrap());
        assert_eq!(store.calls(), 1);

        let roles = resolver.project_roles(&regular, id).await.unwrap();
        assert!(roles.is_manager && roles.is_engineer && roles.is_member);
        assert_eq!(store.calls(), 4);
    }

    #[tokio::test]
    async fn non_admin_without_memberships_resolves_to_false() {
        let store = Arc::new(CountingStore::new(false));
        let resolver = RoleResolver::new(store.clone());
        let regular = user(false);
        let id = Uuid::new_v4();

        let roles = resolver.group_roles(&regular, id).await.unwrap();
        assert_eq!(
            roles,
            GroupRoles {
                is_member: false,
                is_project_manager: false
            }
        );
        assert_eq!(store.calls(), 2);
    }
}
