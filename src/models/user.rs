use serde::{Deserialize, Serialize};

/// Role value that grants access to the admin panel.
pub const ADMIN_ROLE: i64 = 1;

/// Identity record decoded from the bearer token payload (or returned by the
/// backend's user listing). Field names follow the backend's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub nome: Option<String>,
    pub email: String,
    pub tipo: i64,
    #[serde(default, rename = "empresaId")]
    pub empresa_id: Option<i64>,
    #[serde(default, rename = "transportadoraId")]
    pub transportadora_id: Option<String>,
    #[serde(default, rename = "imagemUrl")]
    pub imagem_url: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.tipo == ADMIN_ROLE
    }

    /// Display name for page headers: nome when present, email otherwise.
    pub fn display_name(&self) -> &str {
        self.nome.as_deref().unwrap_or(&self.email)
    }
}
