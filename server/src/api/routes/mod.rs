//! API route handlers

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod questionnaires;
pub mod responses;
pub mod sessions;
pub mod users;
