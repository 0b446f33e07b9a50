pub mod consolidations;
pub mod database;
pub mod email;
pub mod error;
pub mod groups;
pub mod jwt;
pub mod password;
pub mod projects;
pub mod questions;
pub mod terms;
pub mod users;

pub use consolidations::ConsolidationService;
pub use database::Database;
pub use email::{EmailService, ProjectRoleLabel};
pub use error::ServiceError;
pub use groups::GroupService;
pub use jwt::{AccessTokenClaims, JwtService};
pub use password::EncryptionService;
pub use projects::ProjectService;
pub use questions::QuestionService;
pub use terms::TermService;
pub use users::{InvitedUsers, UserService};
