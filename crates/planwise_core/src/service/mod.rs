//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate data-source calls into use-case level APIs.
//! - Keep CLI and embedding layers decoupled from storage details.

pub mod planner_service;
