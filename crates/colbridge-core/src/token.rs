//! Delegation tokens for secured stores.

use std::sync::Arc;

use async_trait::async_trait;
use colbridge_client::ConnectionProvider;
use colbridge_common::{KerberosConfig, OUTPUT_ALIAS};
use tracing::debug;

use crate::error::BridgeResult;

/// Supplies credentials that other processes can use to reach the store.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtains a fresh token.
    async fn obtain_token(&self) -> BridgeResult<Vec<u8>>;

    /// Name of the service the token is for.
    fn alias(&self) -> &str;
}

/// Token provider exporting the store client's authentication credentials.
pub struct StoreTokenProvider {
    connection: Arc<dyn ConnectionProvider>,
    connection_string: String,
    kerberos: KerberosConfig,
}

impl StoreTokenProvider {
    /// Creates a provider for the given connection.
    pub fn new(
        connection: Arc<dyn ConnectionProvider>,
        connection_string: impl Into<String>,
        kerberos: KerberosConfig,
    ) -> Self {
        Self {
            connection,
            connection_string: connection_string.into(),
            kerberos,
        }
    }

    /// Returns the connection string the tokens are for.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

#[async_trait]
impl TokenProvider for StoreTokenProvider {
    async fn obtain_token(&self) -> BridgeResult<Vec<u8>> {
        debug!(
            connection = %self.connection_string,
            principal = self.kerberos.principal.as_deref().unwrap_or("<ticket cache>"),
            "exporting store credentials"
        );
        Ok(self
            .connection
            .client()
            .export_authentication_credentials()
            .await?)
    }

    fn alias(&self) -> &str {
        OUTPUT_ALIAS
    }
}
