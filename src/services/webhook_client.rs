//! HTTP client for the external webhook backend.
//!
//! All business logic (credential checking, code issuance and validation,
//! record persistence) lives behind these endpoints; this client is a thin
//! request/response wrapper with no retries. Responses are interpreted by
//! HTTP status plus an `output` message field.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::models::{Embarcadora, Transportadora, User};

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Transport-level failure; the user retries the action.
    #[error("Erro de conexão. Tente novamente.")]
    Connection(#[source] reqwest::Error),

    /// Non-2xx response. `message` is the backend's `output` (or `message`)
    /// field when the body carried one.
    #[error("{}", message.as_deref().unwrap_or("Erro na requisição"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// 2xx response whose body could not be decoded.
    #[error("Resposta inválida do servidor")]
    InvalidBody(#[source] serde_json::Error),
}

impl WebhookError {
    /// The backend's message for a rejected request, or the given fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            WebhookError::Rejected {
                message: Some(msg), ..
            } => msg.clone(),
            WebhookError::Rejected { message: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

/// Successful two-step verification: the bearer token plus the backend's
/// optional message.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedLogin {
    pub token: String,
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub email: String,
    pub senha: String,
    pub cargo: i64,
}

/// Message envelope the backend attaches to most responses.
#[derive(Debug, Default, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    jwttoken: Option<String>,
}

impl ApiMessage {
    fn text(self) -> Option<String> {
        self.output.or(self.message)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookBackend: Send + Sync {
    /// Step 1: submit credentials; a success means a code was emailed.
    async fn login(&self, email: &str, senha: &str) -> Result<Option<String>, WebhookError>;

    /// Step 2: check the six-digit code; a success yields the bearer token.
    async fn verify_code(&self, email: &str, code: u32) -> Result<VerifiedLogin, WebhookError>;

    /// Admin-only account creation.
    async fn create_user(&self, request: CreateUserRequest)
        -> Result<Option<String>, WebhookError>;

    async fn embarcadoras(
        &self,
        token: &str,
        id: Option<i64>,
    ) -> Result<Vec<Embarcadora>, WebhookError>;

    async fn usuarios(&self, token: &str, id: Option<i64>) -> Result<Vec<User>, WebhookError>;

    async fn transportadoras(
        &self,
        token: &str,
        id: Option<i64>,
    ) -> Result<Vec<Transportadora>, WebhookError>;
}

pub struct HttpWebhookClient {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl HttpWebhookClient {
    pub fn new(config: WebhookConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    /// POSTs a JSON body and returns the status with the decoded message
    /// envelope. Unparseable bodies degrade to an empty envelope, so error
    /// statuses still surface with their fallback message.
    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<(reqwest::StatusCode, ApiMessage), WebhookError> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(WebhookError::Connection)?;

        let status = response.status();
        let text = response.text().await.map_err(WebhookError::Connection)?;
        let message = serde_json::from_str::<ApiMessage>(&text).unwrap_or_default();

        Ok((status, message))
    }

    /// Bearer-authenticated list fetch with the optional `?id=` filter.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        id: Option<i64>,
    ) -> Result<Vec<T>, WebhookError> {
        let mut request = self.client.get(url).bearer_auth(token);
        if let Some(id) = id {
            request = request.query(&[("id", id)]);
        }

        let response = request.send().await.map_err(WebhookError::Connection)?;
        let status = response.status();
        let text = response.text().await.map_err(WebhookError::Connection)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiMessage>(&text)
                .unwrap_or_default()
                .text();
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(WebhookError::InvalidBody)
    }
}

#[async_trait]
impl WebhookBackend for HttpWebhookClient {
    async fn login(&self, email: &str, senha: &str) -> Result<Option<String>, WebhookError> {
        let body = json!({ "email": email.trim(), "senha": senha.trim() });
        let (status, message) = self.post_json(&self.config.login_url(), body).await?;

        if status.is_success() {
            Ok(message.text())
        } else {
            Err(WebhookError::Rejected {
                status: status.as_u16(),
                message: message.text(),
            })
        }
    }

    async fn verify_code(&self, email: &str, code: u32) -> Result<VerifiedLogin, WebhookError> {
        let body = json!({ "email": email.trim(), "code": code });
        let (status, message) = self.post_json(&self.config.verify_url(), body).await?;

        // Success requires both a 2xx status and a token in the body.
        match (status.is_success(), message.jwttoken.clone()) {
            (true, Some(token)) => Ok(VerifiedLogin {
                token,
                output: message.text(),
            }),
            _ => Err(WebhookError::Rejected {
                status: status.as_u16(),
                message: message.text(),
            }),
        }
    }

    async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<Option<String>, WebhookError> {
        let body = json!({
            "email": request.email.trim(),
            "senha": request.senha.trim(),
            "cargo": request.cargo,
        });
        let (status, message) = self.post_json(&self.config.signup_url(), body).await?;

        if status.is_success() {
            Ok(message.text())
        } else {
            Err(WebhookError::Rejected {
                status: status.as_u16(),
                message: message.text(),
            })
        }
    }

    async fn embarcadoras(
        &self,
        token: &str,
        id: Option<i64>,
    ) -> Result<Vec<Embarcadora>, WebhookError> {
        self.fetch_list(&self.config.embarcadoras_url(), token, id)
            .await
    }

    async fn usuarios(&self, token: &str, id: Option<i64>) -> Result<Vec<User>, WebhookError> {
        self.fetch_list(&self.config.usuarios_url(), token, id).await
    }

    async fn transportadoras(
        &self,
        token: &str,
        id: Option<i64>,
    ) -> Result<Vec<Transportadora>, WebhookError> {
        self.fetch_list(&self.config.transportadoras_url(), token, id)
            .await
    }
}
