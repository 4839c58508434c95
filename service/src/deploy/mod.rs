//! Image build and deploy workflow

pub mod detect;
pub mod docker;
pub mod dockerfile;
pub mod git;
pub mod orchestrator;
pub mod pipeline;
