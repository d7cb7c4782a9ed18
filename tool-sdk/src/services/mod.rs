//! Backend-specific evidence adapters
//!
//! One module per observability backend. Every adapter implements
//! `EvidenceAdapter` and is wired into the registry by `AdapterRegistry::from_backends`.

pub mod alertmanager;
pub mod common;
pub mod knowledge_base;
pub mod kubernetes;
pub mod loki;
pub mod prometheus;
