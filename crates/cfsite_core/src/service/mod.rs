//! Site-level service wiring.
//!
//! # Responsibility
//! - Connect the configured backend once and hand out repositories sharing it.
//! - Keep CLI and other callers decoupled from backend selection.

pub mod site_service;
