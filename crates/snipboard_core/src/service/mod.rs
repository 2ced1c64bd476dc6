//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate repository `NotFound` errors into domain variants.
//! - Keep canvas/viewer callers decoupled from storage details.

pub mod annotation_service;
pub mod graph_service;
pub mod project_service;
