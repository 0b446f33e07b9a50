pub mod consolidation;
pub mod group;
pub mod project;
pub mod question;
pub mod term;
pub mod user;

pub use consolidation::Consolidation;
pub use group::{Group, GroupWithCounts};
pub use project::{Project, ProjectWithCounts};
pub use question::{Comment, Question, QuestionWithRating, Rating};
pub use term::{Passage, Term};
pub use user::User;
