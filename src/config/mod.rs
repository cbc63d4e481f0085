pub mod session;
pub mod webhook;

pub use session::{validate_production_config, SessionConfig, SessionLayer};
pub use webhook::WebhookConfig;
