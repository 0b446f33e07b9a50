//! CQ Manager - collaborative question and annotation management backend.

pub mod authz;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
