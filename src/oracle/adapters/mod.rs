use async_trait::async_trait;

use crate::oracle::{
    error::OracleError,
    types::{AdapterContext, ChatPayload, RawResult},
};

pub mod http_common;
pub mod openai_compatible;

#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        ctx: AdapterContext,
        payload: ChatPayload,
    ) -> Result<RawResult, OracleError>;
}
