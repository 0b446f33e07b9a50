pub mod consolidations;
pub mod groups;
pub mod health;
pub mod projects;
pub mod questions;
pub mod terms;
pub mod users;

pub use health::health_check;
