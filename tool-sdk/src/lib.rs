//! # Tool SDK
//!
//! Evidence adapters for the cluster observability backends.
//!
//! This crate provides:
//!
//! - The `EvidenceAdapter` contract every backend connector implements
//! - HTTP adapters for Prometheus, Loki, Alertmanager and the Kubernetes API,
//!   plus a built-in runbook catalogue
//! - `AdapterRegistry`, mapping adapter identifiers to implementations
//! - A normalised `ServiceError` with HTTP status mapping
//! - Configuration providers for backend endpoints

pub mod core;
pub use core::EvidenceAdapter;

pub mod services;

pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

pub mod config;
pub use config::{BackendsConfig, ConfigProvider, ServiceConfig};

pub mod registry;
pub use registry::AdapterRegistry;

#[cfg(test)]
mod tests;
