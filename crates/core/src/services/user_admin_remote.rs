//! HTTP client for an externally hosted user administration function.

use async_trait::async_trait;
use grantdesk_common::{AppError, AppResult, config::UserAdminConfig};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user_admin::{ActionResults, GatewayError, UserAction, UserAdminGateway};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionRequest<'a> {
    action: UserAction,
    user_ids: &'a [String],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionResponse {
    Results {
        results: ActionResults,
    },
    Error {
        error: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        details: Option<Value>,
    },
}

/// Calls the remote function with `{action, userIds}` and a bearer service key.
#[derive(Clone)]
pub struct RemoteUserAdmin {
    http_client: reqwest::Client,
    endpoint: url::Url,
    service_key: Option<String>,
}

impl RemoteUserAdmin {
    /// Create a client for the given endpoint.
    #[must_use]
    pub fn new(endpoint: url::Url, service_key: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint,
            service_key,
        }
    }

    /// Build a client from configuration, if a remote endpoint is set.
    pub fn from_config(config: &UserAdminConfig) -> AppResult<Option<Self>> {
        let Some(endpoint) = config.endpoint.clone() else {
            return Ok(None);
        };
        if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
            return Err(AppError::Config(format!(
                "Unsupported user admin endpoint scheme: {}",
                endpoint.scheme()
            )));
        }
        Ok(Some(Self::new(endpoint, config.service_key.clone())))
    }

    #[must_use]
    pub const fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

/// Map a raw response onto the typed contract.
fn parse_response(status: StatusCode, body: &str) -> Result<ActionResults, GatewayError> {
    match serde_json::from_str::<ActionResponse>(body) {
        Ok(ActionResponse::Results { results }) if status.is_success() => Ok(results),
        Ok(ActionResponse::Error {
            error,
            message,
            details,
        }) => Err(GatewayError::Rejected {
            error,
            message,
            details,
        }),
        Ok(ActionResponse::Results { .. }) | Err(_) => Err(GatewayError::Transport(format!(
            "unexpected response: {status}"
        ))),
    }
}

#[async_trait]
impl UserAdminGateway for RemoteUserAdmin {
    async fn execute(
        &self,
        action: UserAction,
        user_ids: &[String],
    ) -> Result<ActionResults, GatewayError> {
        let mut request = self
            .http_client
            .post(self.endpoint.clone())
            .json(&ActionRequest { action, user_ids });
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to read response: {e}")))?;

        let result = parse_response(status, &body);
        if let Err(e) = &result {
            tracing::warn!(
                error = %e,
                %status,
                action = action.as_str(),
                "Remote user administration call failed"
            );
        }
        result
    }
}
