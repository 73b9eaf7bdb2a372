//! Access to the external reasoning oracle.
//!
//! The orchestrator only sees the [`Oracle`] capability. [`gateway::OracleGateway`] is the
//! production implementation, backed by an OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;

pub mod adapters;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod prompts;
pub mod telemetry;
pub mod types;

pub use error::{OracleError, OracleErrorKind};
pub use gateway::OracleGateway;
pub use types::{ContextValue, OraclePurpose, OracleRequest, PriorTurn, RawResult};

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Returns the oracle's raw answer or the reason it could not produce one.
    /// Dropping the future abandons the in-flight call.
    async fn invoke(&self, request: OracleRequest) -> Result<RawResult, OracleError>;
}
