//! # Student Directory Common Library
//!
//! Shared code for the student directory service including:
//! - Student record model and query types
//! - Filter-sort engine
//! - Heuristic match-ranking engine
//! - Identity-state events
//! - Configuration loading
//! - SSE utilities

pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod model;
pub mod rank;
pub mod sse;

pub use error::{Error, Result};
pub use model::{Course, Department, FilterSpec, RankQuery, SortKey, StudentRecord};
pub use rank::{MatchRanker, RankedResult};
