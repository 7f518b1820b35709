// ABOUTME: Root library module exposing all public modules
// ABOUTME: Provides access to config, intent matching, sessions, presence, and the HTTP server

pub mod assistant;
pub mod cards;
pub mod config;
pub mod identity;
pub mod intent;
pub mod metrics;
pub mod paths;
pub mod presence;
pub mod server;
pub mod session;
