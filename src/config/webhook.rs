use std::env;

const DEFAULT_BASE_URL: &str = "https://n8n.srv1251718.hstgr.cloud/webhook";

/// Endpoints of the external webhook backend. Every business action in the
/// portal resolves to one of these URLs; nothing is persisted locally.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    base_url: String,
}

impl WebhookConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn from_env() -> Self {
        let base = env::var("WEBHOOK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    pub fn verify_url(&self) -> String {
        format!("{}/v2f", self.base_url)
    }

    // Endpoint spelling is part of the backend contract.
    pub fn signup_url(&self) -> String {
        format!("{}/singup", self.base_url)
    }

    pub fn embarcadoras_url(&self) -> String {
        format!("{}/embarcadoras", self.base_url)
    }

    pub fn usuarios_url(&self) -> String {
        format!("{}/usuarios", self.base_url)
    }

    pub fn transportadoras_url(&self) -> String {
        format!("{}/transportadoras", self.base_url)
    }
}
