//! HTTP API handlers

pub mod ai_search;
pub mod auth;
pub mod face_search;
pub mod health;
pub mod search;
pub mod sse;
pub mod students;
pub mod ui;
