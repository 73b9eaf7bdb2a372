use std::env;

use async_trait::async_trait;

use crate::oracle::{
    error::{OracleError, unreachable},
    types::{CredentialRef, ResolvedCredential},
};

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self, reference: &CredentialRef) -> Result<ResolvedCredential, OracleError>;
}

/// Resolves `env` references from the process environment and passes inline tokens through.
#[derive(Default)]
pub struct EnvCredentialProvider;

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn resolve(&self, reference: &CredentialRef) -> Result<ResolvedCredential, OracleError> {
        match reference {
            CredentialRef::Env { var } => {
                let token = env::var(var).map_err(|_| {
                    unreachable(format!("missing credential environment variable {var}"))
                })?;
                if token.trim().is_empty() {
                    return Err(unreachable(format!(
                        "credential environment variable {var} is empty"
                    )));
                }
                Ok(ResolvedCredential::bearer(token.trim()))
            }
            CredentialRef::InlineToken { token } => {
                if token.trim().is_empty() {
                    return Err(unreachable("inline credential token cannot be empty"));
                }
                Ok(ResolvedCredential::bearer(token.trim()))
            }
            CredentialRef::None => Ok(ResolvedCredential::none()),
        }
    }
}
