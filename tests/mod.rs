//! Integration tests for streamgate
//!
//! Tests are organized by component:
//! - extract_test: media URL extraction pattern tests
//! - catalog_test: source catalog construction tests
//! - session_test: failover session controller tests
//! - relay_test: egress relay HTTP contract tests
//! - stats_test: history store and dashboard aggregation tests
//! - cli_test: CLI parsing and output format tests

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
