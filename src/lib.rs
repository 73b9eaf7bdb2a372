// For integration tests only, lifeline ships as a binary
pub mod cli;
pub mod config;
pub mod logging;
pub mod oracle;
pub mod orchestrator;
pub mod protocol;
pub mod router;
pub mod server;
pub mod session;
pub mod testing;
pub mod types;
pub mod validator;
