//! db-gateway: database mediation gateway
//!
//! Sits between an LLM agent and a relational database, exposing a
//! constrained tool surface that enforces both the connected user's native
//! database privileges and a caller-supplied access control list before
//! any SQL statement executes.

pub mod acl;
pub mod config;
pub mod core;
pub mod db;
pub mod gate;
pub mod projector;
pub mod sql;
pub mod tools;
pub mod transport;

pub use config::Cli;
pub use core::{GatewayContext, GatewayFlags};
