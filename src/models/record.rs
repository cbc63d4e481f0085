use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shipper company record, read-only from the backend. The backend may attach
/// extra columns; they are carried opaquely in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embarcadora {
    pub id: i64,
    pub nome: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Carrier company record, same shape as `Embarcadora`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transportadora {
    pub id: i64,
    pub nome: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
