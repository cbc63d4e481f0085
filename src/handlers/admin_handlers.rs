use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::auth::session_auth;
use crate::error::AppError;
use crate::handlers::forms::{self, CreateUserForm, FieldErrors};
use crate::middleware::csrf;
use crate::services::CreateUserRequest;
use crate::AppState;

const MSG_USER_CREATED: &str = "Usuário criado com sucesso!";
const MSG_CREATE_FAILED: &str = "Erro ao criar usuário";

#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
struct AdminTemplate {
    csrf_token: String,
    user_name: String,
    email: String,
    cargo: String,
    email_error: Option<String>,
    senha_error: Option<String>,
    cargo_error: Option<String>,
    message: Option<String>,
    message_is_error: bool,
}

impl AdminTemplate {
    fn blank(csrf_token: String, user_name: String) -> Self {
        Self {
            csrf_token,
            user_name,
            email: String::new(),
            cargo: String::new(),
            email_error: None,
            senha_error: None,
            cargo_error: None,
            message: None,
            message_is_error: false,
        }
    }
}

fn render(template: AdminTemplate) -> Result<Response, AppError> {
    Ok(template.into_response())
}

/// Admin pages are for role 1 only; everyone else lands back on the
/// dashboard rather than seeing an error page.
async fn require_admin(session: &Session) -> Result<crate::models::AuthSession, Response> {
    match session_auth::current(session).await {
        Ok(Some(auth)) if auth.is_admin() => Ok(auth),
        Ok(Some(_)) => Err(Redirect::to("/dashboard").into_response()),
        Ok(None) => Err(Redirect::to("/login").into_response()),
        Err(e) => Err(AppError::from(e).into_response()),
    }
}

/// GET /admin — the user-creation form.
pub async fn admin_page(session: Session) -> Result<Response, AppError> {
    let auth = match require_admin(&session).await {
        Ok(auth) => auth,
        Err(redirect) => return Ok(redirect),
    };

    let csrf_token = csrf::get_or_create_csrf_token(&session).await?;
    render(AdminTemplate::blank(
        csrf_token,
        auth.user.display_name().to_string(),
    ))
}

/// POST /admin/users — validate, then hand the new account to the backend.
/// Success clears the form and shows a confirmation panel; failures re-render
/// with the entered values kept.
pub async fn create_user_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateUserForm>,
) -> Result<Response, AppError> {
    let auth = match require_admin(&session).await {
        Ok(auth) => auth,
        Err(redirect) => return Ok(redirect),
    };

    if let Err(status) = csrf::validate_csrf_form_field(&session, &form.csrf_token).await {
        return Ok(status.into_response());
    }
    let csrf_token = csrf::get_or_create_csrf_token(&session).await?;
    let user_name = auth.user.display_name().to_string();

    let cargo = form.cargo.trim().parse::<i64>().ok();
    let errors = forms::validate_new_user(&form.email, &form.senha, cargo);
    if !errors.is_empty() {
        let FieldErrors {
            email: email_error,
            senha: senha_error,
            cargo: cargo_error,
        } = errors;
        return render(AdminTemplate {
            csrf_token,
            user_name,
            email: form.email,
            cargo: form.cargo,
            email_error,
            senha_error,
            cargo_error,
            message: None,
            message_is_error: false,
        });
    }

    let request = CreateUserRequest {
        email: form.email.trim().to_string(),
        senha: form.senha.trim().to_string(),
        // Validation already established a value in range.
        cargo: cargo.unwrap_or_default(),
    };

    match state.webhook.create_user(request).await {
        Ok(_) => {
            tracing::info!(email = %form.email.trim(), "account created");
            let mut template = AdminTemplate::blank(csrf_token, user_name);
            template.message = Some(MSG_USER_CREATED.to_string());
            render(template)
        }
        Err(e) => {
            let message = e.user_message(MSG_CREATE_FAILED);
            render(AdminTemplate {
                csrf_token,
                user_name,
                email: form.email,
                cargo: form.cargo,
                email_error: None,
                senha_error: None,
                cargo_error: None,
                message: Some(message),
                message_is_error: true,
            })
        }
    }
}
