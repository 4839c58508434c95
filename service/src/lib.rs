//! kubeship Library
//!
//! Turns a Git repository into a running Kubernetes deployment: detect the
//! project type, synthesize a Dockerfile, build and push the image, then create
//! or update the Deployment and its Service.

pub mod app;
pub mod authn;
pub mod cluster;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
