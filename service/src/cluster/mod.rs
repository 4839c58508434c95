//! Kubernetes deployment management

pub mod api;
pub mod deployer;
pub mod client;
pub mod manifest;
