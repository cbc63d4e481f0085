//! Form payloads and field validation.
//!
//! Validation runs before any network call; failures render inline per-field
//! messages without touching the backend.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const EMAIL_MAX_LEN: usize = 255;
pub const SENHA_MAX_LEN: usize = 100;
pub const SENHA_MIN_LEN_NEW_USER: usize = 6;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub senha: String,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub code: String,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CsrfOnlyForm {
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    pub email: String,
    pub senha: String,
    pub cargo: String,
    pub csrf_token: String,
}

/// Per-field messages shown inline next to the inputs.
#[derive(Debug, Default, PartialEq)]
pub struct FieldErrors {
    pub email: Option<String>,
    pub senha: Option<String>,
    pub cargo: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.senha.is_none() && self.cargo.is_none()
    }
}

fn validate_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.len() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(email) {
        Some("Digite um email válido".to_string())
    } else {
        None
    }
}

/// Login form: valid email, non-empty password.
pub fn validate_login(email: &str, senha: &str) -> FieldErrors {
    let senha = senha.trim();
    FieldErrors {
        email: validate_email(email),
        senha: if senha.is_empty() {
            Some("A senha é obrigatória".to_string())
        } else if senha.len() > SENHA_MAX_LEN {
            Some("Senha muito longa".to_string())
        } else {
            None
        },
        cargo: None,
    }
}

/// Admin user-creation form: valid email, password of at least six
/// characters, cargo between 1 and 10.
pub fn validate_new_user(email: &str, senha: &str, cargo: Option<i64>) -> FieldErrors {
    let senha = senha.trim();
    FieldErrors {
        email: validate_email(email),
        senha: if senha.len() < SENHA_MIN_LEN_NEW_USER {
            Some("A senha deve ter pelo menos 6 caracteres".to_string())
        } else if senha.len() > SENHA_MAX_LEN {
            Some("Senha muito longa".to_string())
        } else {
            None
        },
        cargo: match cargo {
            Some(c) if (1..=10).contains(&c) => None,
            _ => Some("Tipo de usuário inválido".to_string()),
        },
    }
}
