use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::session_auth;
use crate::error::AppError;
use crate::models::{Embarcadora, Transportadora, User};
use crate::AppState;

const MSG_LOAD_FAILED: &str = "Erro ao carregar dados";

/// The three read-only listings the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Embarcadoras,
    Usuarios,
    Transportadoras,
}

impl Tab {
    /// Unknown or missing values fall back to the shippers listing.
    fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("usuarios") => Tab::Usuarios,
            Some("transportadoras") => Tab::Transportadoras,
            _ => Tab::Embarcadoras,
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Tab::Embarcadoras => "embarcadoras",
            Tab::Usuarios => "usuarios",
            Tab::Transportadoras => "transportadoras",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub id: Option<i64>,
}

/// One company line in the shippers/carriers tables.
struct CompanyRow {
    id: i64,
    nome: String,
    email: String,
    cnpj: String,
}

impl CompanyRow {
    fn from_embarcadora(record: Embarcadora) -> Self {
        Self {
            id: record.id,
            nome: record.nome,
            email: record.email.unwrap_or_default(),
            cnpj: record.cnpj.unwrap_or_default(),
        }
    }

    fn from_transportadora(record: Transportadora) -> Self {
        Self {
            id: record.id,
            nome: record.nome,
            email: record.email.unwrap_or_default(),
            cnpj: record.cnpj.unwrap_or_default(),
        }
    }
}

/// One account line in the users table.
struct UserRow {
    id: i64,
    nome: String,
    email: String,
    tipo: i64,
}

impl UserRow {
    fn from_user(user: User) -> Self {
        let nome = user.display_name().to_string();
        Self {
            id: user.id,
            nome,
            email: user.email,
            tipo: user.tipo,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    user_name: String,
    is_admin: bool,
    tab: &'static str,
    id_filter: Option<i64>,
    companies: Vec<CompanyRow>,
    users: Vec<UserRow>,
    error: Option<String>,
}

/// GET /dashboard?tab=&id= — one of the three listings, fetched fresh from
/// the backend on every request. A fetch failure renders the page shell with
/// an inline error and a retry link instead of failing the request.
pub async fn dashboard_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let auth = match session_auth::current(&session).await? {
        Some(auth) => auth,
        None => return Ok(Redirect::to("/login").into_response()),
    };

    let tab = Tab::from_param(query.tab.as_deref());

    let mut template = DashboardTemplate {
        user_name: auth.user.display_name().to_string(),
        is_admin: auth.is_admin(),
        tab: tab.slug(),
        id_filter: query.id,
        companies: Vec::new(),
        users: Vec::new(),
        error: None,
    };

    let fetched = match tab {
        Tab::Embarcadoras => state
            .webhook
            .embarcadoras(&auth.token, query.id)
            .await
            .map(|records| {
                template.companies = records
                    .into_iter()
                    .map(CompanyRow::from_embarcadora)
                    .collect();
            }),
        Tab::Usuarios => state
            .webhook
            .usuarios(&auth.token, query.id)
            .await
            .map(|records| {
                template.users = records.into_iter().map(UserRow::from_user).collect();
            }),
        Tab::Transportadoras => state
            .webhook
            .transportadoras(&auth.token, query.id)
            .await
            .map(|records| {
                template.companies = records
                    .into_iter()
                    .map(CompanyRow::from_transportadora)
                    .collect();
            }),
    };

    if let Err(e) = fetched {
        tracing::warn!(tab = tab.slug(), error = %e, "dashboard fetch failed");
        template.error = Some(e.user_message(MSG_LOAD_FAILED));
    }

    Ok(template.into_response())
}
