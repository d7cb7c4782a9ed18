//! Unit tests for the Tool SDK
//!
//! Adapter tests run against WireMock servers standing in for the backends.

pub mod config_tests;
pub mod error_tests;
pub mod kubernetes_mock_tests;
