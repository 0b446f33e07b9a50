//! Authorization core: membership queries, role resolution, route guards and
//! advisory permission headers.
//!
//! Guards block a request before its handler runs; the header middleware runs
//! after the handler and only annotates the response. Both read through the
//! same [`RoleResolver`], issuing their own queries per request (accepted
//! duplication, results are never cached across requests).

pub mod guard;
pub mod headers;
pub mod resolver;
pub mod store;

pub use guard::{require_role, RequiredRole};
pub use headers::{
    group_permission_headers, project_permission_headers, GROUP_MEMBER_HEADER,
    PROJECT_ENGINEER_HEADER, PROJECT_MANAGER_HEADER, PROJECT_MEMBER_HEADER,
};
pub use resolver::{GroupRoles, ProjectRoles, RoleResolver};
pub use store::{MembershipQueries, PgMembershipStore};
