//! Workflow integration tests
//!
//! Tests for complete workflows that exercise the coordinator and the
//! `shelf` binary end to end.

pub mod cli_surface;
pub mod edge_cases;
