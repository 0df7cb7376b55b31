//! Remote session endpoints

use super::types::UserIdentity;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::JsonValue;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Backend calls that validate and invalidate a token
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Resolve the identity behind `token`, failing if the token is rejected
    async fn validate(&self, token: &str) -> Result<UserIdentity>;

    /// Invalidate `token` on the backend
    async fn logout(&self, token: &str) -> Result<()>;
}

#[async_trait]
impl<A: AuthApi + ?Sized> AuthApi for Arc<A> {
    async fn validate(&self, token: &str) -> Result<UserIdentity> {
        (**self).validate(token).await
    }

    async fn logout(&self, token: &str) -> Result<()> {
        (**self).logout(token).await
    }
}

/// `AuthApi` over the REST backend.
///
/// Requests carry the token being checked rather than whatever the client's
/// token source would supply.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: HttpClient,
    me_path: String,
    logout_path: String,
}

impl HttpAuthApi {
    /// Create an API using the given endpoint paths
    pub fn new(
        client: HttpClient,
        me_path: impl Into<String>,
        logout_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            me_path: me_path.into(),
            logout_path: logout_path.into(),
        }
    }

    /// Create an API from the client configuration
    pub fn from_config(client: HttpClient, config: &crate::config::ClientConfig) -> Self {
        Self::new(client, &config.me_path, &config.logout_path)
    }

    fn with_token(token: &str) -> RequestConfig {
        RequestConfig::new()
            .anonymous()
            .header("Authorization", format!("Bearer {token}"))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn validate(&self, token: &str) -> Result<UserIdentity> {
        let body: JsonValue = self
            .client
            .get_json_with_config(&self.me_path, Self::with_token(token))
            .await?;

        // Accept the identity either bare or wrapped as {"user": {...}}
        let identity = match body {
            JsonValue::Object(mut map) if map.get("user").is_some_and(JsonValue::is_object) => {
                map.remove("user").unwrap_or_default()
            }
            other => other,
        };

        let user: UserIdentity = serde_json::from_value(identity)
            .map_err(|e| Error::decode(format!("Invalid identity payload: {e}")))?;
        debug!("Token belongs to user {}", user.id);
        Ok(user)
    }

    async fn logout(&self, token: &str) -> Result<()> {
        self.client
            .post_with_config(&self.logout_path, Self::with_token(token))
            .await?;
        Ok(())
    }
}
