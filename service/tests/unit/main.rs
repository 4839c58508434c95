//! Integration tests

mod test_deployer;
mod test_pipeline;
mod test_server;
