//! Bearer token decoding.
//!
//! The webhook backend issues an HS256 JWT whose payload carries the user
//! identity. When `WEBHOOK_TOKEN_SECRET` is configured the signature is
//! verified before the payload is trusted; without it the payload is decoded
//! as-is, for backends that do not share their signing key. Expiry is
//! governed by the 24-hour session, not by token claims.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::warn;

use crate::models::user::User;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
    #[error("Token signature rejected")]
    BadSignature,
}

/// Payload of the backend's bearer token. `role` is the wire name for the
/// user's `tipo`.
#[derive(Debug, Deserialize)]
struct Claims {
    id: i64,
    email: String,
    #[serde(default)]
    nome: Option<String>,
    role: i64,
    #[serde(default, rename = "empresaId")]
    empresa_id: Option<i64>,
    #[serde(default, rename = "transportadoraId")]
    transportadora_id: Option<String>,
    #[serde(default, rename = "imagemUrl")]
    imagem_url: Option<String>,
}

impl From<Claims> for User {
    fn from(claims: Claims) -> Self {
        User {
            id: claims.id,
            nome: claims.nome,
            email: claims.email,
            tipo: claims.role,
            empresa_id: claims.empresa_id,
            transportadora_id: claims.transportadora_id,
            imagem_url: claims.imagem_url,
        }
    }
}

pub struct TokenDecoder {
    secret: Option<Vec<u8>>,
}

impl TokenDecoder {
    pub fn new(secret: Option<Vec<u8>>) -> Self {
        if secret.is_none() {
            warn!("WEBHOOK_TOKEN_SECRET not set; token payloads are decoded without signature verification");
        }
        Self { secret }
    }

    pub fn from_env() -> Self {
        let secret = std::env::var("WEBHOOK_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.into_bytes());
        Self::new(secret)
    }

    /// Decodes the token payload into a `User`, verifying the signature when
    /// a secret is configured.
    pub fn decode(&self, token: &str) -> Result<User, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The backend omits exp/iat; the session TTL bounds the lifetime.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let key = match &self.secret {
            Some(secret) => DecodingKey::from_secret(secret),
            None => {
                validation.insecure_disable_signature_validation();
                DecodingKey::from_secret(&[])
            }
        };

        let data = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e),
            }
        })?;

        Ok(data.claims.into())
    }
}
