//! Command implementations

pub mod config;
pub mod export;
pub mod flatten;
pub mod verify;
