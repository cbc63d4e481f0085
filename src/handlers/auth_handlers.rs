use askama::Template;
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::auth::flow::{Effect, Event, LoginFlow, VerificationState};
use crate::auth::session_auth;
use crate::error::AppError;
use crate::handlers::forms::{self, CsrfOnlyForm, FieldErrors, LoginForm, VerifyForm};
use crate::middleware::csrf;
use crate::AppState;

const MSG_CODE_SENT: &str = "Código enviado para seu email!";
const MSG_CODE_RESENT: &str = "Novo código enviado!";
const MSG_CODE_EXPIRED: &str = "Código expirado. Faça login novamente.";
const MSG_CODE_INVALID: &str = "Código inválido";
const MSG_CODE_INCOMPLETE: &str = "Digite o código completo";
const MSG_BAD_CREDENTIALS: &str = "Credenciais inválidas";
const MSG_RESEND_FAILED: &str = "Erro ao reenviar código";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    csrf_token: String,
    email: String,
    email_error: Option<String>,
    senha_error: Option<String>,
    message: Option<String>,
    message_is_error: bool,
    verification: Option<VerifyView>,
}

/// Data the verification step needs: whose code, and how long is left.
struct VerifyView {
    email: String,
    remaining_secs: i64,
    deadline_ms: i64,
}

impl VerifyView {
    fn from_state(state: &VerificationState) -> Self {
        Self {
            email: state.email.clone(),
            remaining_secs: state.remaining_secs(Utc::now()),
            deadline_ms: state.deadline.timestamp_millis(),
        }
    }
}

fn credentials_page(
    csrf_token: String,
    email: String,
    errors: FieldErrors,
    message: Option<&str>,
    message_is_error: bool,
) -> LoginTemplate {
    LoginTemplate {
        csrf_token,
        email,
        email_error: errors.email,
        senha_error: errors.senha,
        message: message.map(str::to_string),
        message_is_error,
        verification: None,
    }
}

fn verification_page(
    csrf_token: String,
    state: &VerificationState,
    message: Option<&str>,
    message_is_error: bool,
) -> LoginTemplate {
    LoginTemplate {
        csrf_token,
        email: String::new(),
        email_error: None,
        senha_error: None,
        message: message.map(str::to_string),
        message_is_error,
        verification: Some(VerifyView::from_state(state)),
    }
}

fn render(template: LoginTemplate) -> Result<Response, AppError> {
    Ok(Html(template.render()?).into_response())
}

/// GET /login — credentials form, or the verification step when a pending
/// flow exists. Stale flows revert here with the expiry message.
pub async fn login_page(session: Session) -> Result<Response, AppError> {
    let csrf_token = csrf::get_or_create_csrf_token(&session).await?;

    let mut flow = session_auth::load_flow(&session).await?;
    let effect = flow.apply(Event::Tick { now: Utc::now() });
    session_auth::store_flow(&session, &flow).await?;

    if effect == Effect::Expired {
        return render(credentials_page(
            csrf_token,
            String::new(),
            FieldErrors::default(),
            Some(MSG_CODE_EXPIRED),
            true,
        ));
    }

    match &flow {
        LoginFlow::Verification(state) => render(verification_page(csrf_token, state, None, false)),
        _ => render(credentials_page(
            csrf_token,
            String::new(),
            FieldErrors::default(),
            None,
            false,
        )),
    }
}

/// POST /login — validate the fields, then submit credentials to the backend.
/// A non-error response advances to the verification step and starts the
/// seven-minute countdown.
pub async fn login_submit_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Err(status) = csrf::validate_csrf_form_field(&session, &form.csrf_token).await {
        return Ok(status.into_response());
    }
    let csrf_token = csrf::get_or_create_csrf_token(&session).await?;

    let errors = forms::validate_login(&form.email, &form.senha);
    if !errors.is_empty() {
        return render(credentials_page(csrf_token, form.email, errors, None, false));
    }

    let email = form.email.trim();
    let senha = form.senha.trim();

    match state.webhook.login(email, senha).await {
        Ok(_) => {
            let mut flow = LoginFlow::new();
            flow.apply(Event::CredentialsAccepted {
                email,
                senha,
                now: Utc::now(),
            });
            session_auth::store_flow(&session, &flow).await?;
            tracing::info!(email = %email, "credentials accepted, verification code sent");

            match &flow {
                LoginFlow::Verification(pending) => render(verification_page(
                    csrf_token,
                    pending,
                    Some(MSG_CODE_SENT),
                    false,
                )),
                _ => Err(AppError::InternalError),
            }
        }
        Err(e) => {
            let message = e.user_message(MSG_BAD_CREDENTIALS);
            render(credentials_page(
                csrf_token,
                form.email,
                FieldErrors::default(),
                Some(&message),
                true,
            ))
        }
    }
}

/// POST /login/verify — feed the posted code through the flow reducer and,
/// when it yields a full code, check it against the backend. Success decodes
/// the bearer token, persists the 24-hour session and redirects.
pub async fn verify_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VerifyForm>,
) -> Result<Response, AppError> {
    if let Err(status) = csrf::validate_csrf_form_field(&session, &form.csrf_token).await {
        return Ok(status.into_response());
    }
    let csrf_token = csrf::get_or_create_csrf_token(&session).await?;

    let mut flow = session_auth::load_flow(&session).await?;
    let email = match &flow {
        LoginFlow::Verification(pending) => pending.email.clone(),
        _ => return Ok(Redirect::to("/login").into_response()),
    };

    let now = Utc::now();
    let mut effect = flow.apply(Event::Paste {
        text: &form.code,
        now,
    });
    if effect == Effect::None {
        // Explicit verify press with fewer than six digits entered.
        effect = flow.apply(Event::Submit { now });
    }

    match effect {
        Effect::Expired => {
            session_auth::store_flow(&session, &flow).await?;
            render(credentials_page(
                csrf_token,
                String::new(),
                FieldErrors::default(),
                Some(MSG_CODE_EXPIRED),
                true,
            ))
        }
        Effect::Incomplete => {
            session_auth::store_flow(&session, &flow).await?;
            verification_response(&flow, csrf_token, Some(MSG_CODE_INCOMPLETE), true)
        }
        Effect::SubmitCode(code) => {
            let number: u32 = match code.parse() {
                Ok(n) => n,
                Err(_) => {
                    flow.apply(Event::CodeRejected);
                    session_auth::store_flow(&session, &flow).await?;
                    return verification_response(&flow, csrf_token, Some(MSG_CODE_INVALID), true);
                }
            };

            match state.webhook.verify_code(&email, number).await {
                Ok(verified) => match state.token_decoder.decode(&verified.token) {
                    Ok(user) => {
                        flow.apply(Event::CodeAccepted);
                        session_auth::login(&session, user, verified.token).await?;
                        tracing::info!(email = %email, "two-step verification succeeded");
                        Ok(Redirect::to("/dashboard").into_response())
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "bearer token rejected");
                        flow.apply(Event::CodeRejected);
                        session_auth::store_flow(&session, &flow).await?;
                        verification_response(&flow, csrf_token, Some(MSG_CODE_INVALID), true)
                    }
                },
                Err(e @ crate::services::WebhookError::Rejected { .. }) => {
                    let message = e.user_message(MSG_CODE_INVALID);
                    flow.apply(Event::CodeRejected);
                    session_auth::store_flow(&session, &flow).await?;
                    verification_response(&flow, csrf_token, Some(&message), true)
                }
                Err(e) => {
                    // Connectivity failure: keep the entered digits so the
                    // user can simply retry.
                    session_auth::store_flow(&session, &flow).await?;
                    let message = e.to_string();
                    verification_response(&flow, csrf_token, Some(&message), true)
                }
            }
        }
        _ => {
            session_auth::store_flow(&session, &flow).await?;
            verification_response(&flow, csrf_token, Some(MSG_CODE_INCOMPLETE), true)
        }
    }
}

fn verification_response(
    flow: &LoginFlow,
    csrf_token: String,
    message: Option<&str>,
    message_is_error: bool,
) -> Result<Response, AppError> {
    match flow {
        LoginFlow::Verification(pending) => render(verification_page(
            csrf_token,
            pending,
            message,
            message_is_error,
        )),
        _ => Ok(Redirect::to("/login").into_response()),
    }
}

/// POST /login/resend — re-post the stored credentials; success restarts the
/// countdown and clears entered digits.
pub async fn resend_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CsrfOnlyForm>,
) -> Result<Response, AppError> {
    if let Err(status) = csrf::validate_csrf_form_field(&session, &form.csrf_token).await {
        return Ok(status.into_response());
    }
    let csrf_token = csrf::get_or_create_csrf_token(&session).await?;

    let mut flow = session_auth::load_flow(&session).await?;
    let now = Utc::now();

    if flow.apply(Event::Tick { now }) == Effect::Expired {
        session_auth::store_flow(&session, &flow).await?;
        return render(credentials_page(
            csrf_token,
            String::new(),
            FieldErrors::default(),
            Some(MSG_CODE_EXPIRED),
            true,
        ));
    }

    let (email, senha) = match &flow {
        LoginFlow::Verification(pending) => (pending.email.clone(), pending.senha.clone()),
        _ => return Ok(Redirect::to("/login").into_response()),
    };

    match state.webhook.login(&email, &senha).await {
        Ok(_) => {
            flow.apply(Event::Resend { now });
            session_auth::store_flow(&session, &flow).await?;
            tracing::info!(email = %email, "verification code resent");
            verification_response(&flow, csrf_token, Some(MSG_CODE_RESENT), false)
        }
        Err(e) => {
            let message = e.user_message(MSG_RESEND_FAILED);
            session_auth::store_flow(&session, &flow).await?;
            verification_response(&flow, csrf_token, Some(&message), true)
        }
    }
}

/// POST /login/back — explicit navigation back to the credentials step,
/// dropping the pending code.
pub async fn back_handler(
    session: Session,
    Form(form): Form<CsrfOnlyForm>,
) -> Result<Response, AppError> {
    if let Err(status) = csrf::validate_csrf_form_field(&session, &form.csrf_token).await {
        return Ok(status.into_response());
    }
    let csrf_token = csrf::get_or_create_csrf_token(&session).await?;

    let mut flow = session_auth::load_flow(&session).await?;
    flow.apply(Event::Back);
    session_auth::store_flow(&session, &flow).await?;

    render(credentials_page(
        csrf_token,
        String::new(),
        FieldErrors::default(),
        None,
        false,
    ))
}

/// GET /logout — clear persisted and in-memory state.
pub async fn logout_handler(session: Session) -> Result<Response, AppError> {
    session_auth::logout(&session).await?;
    Ok(Redirect::to("/login").into_response())
}
