//! Library exports for the SkillSwap API
//!
//! The binary in `main.rs` only wires configuration, storage and the
//! router together; everything else lives here so tests can drive it.

pub mod config;
pub mod course;
pub mod credential;
pub mod database;
pub mod dto;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod policy;
pub mod profile;
pub mod route;
pub mod swap;
pub mod token;
