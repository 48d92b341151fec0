//! HTTP extension that creates and lists realm users behind scoped bearer
//! tokens and a permission-ticket check.
pub mod api;
pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
