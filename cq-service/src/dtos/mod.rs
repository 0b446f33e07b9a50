pub mod consolidations;
pub mod groups;
pub mod projects;
pub mod questions;
pub mod terms;
pub mod users;
