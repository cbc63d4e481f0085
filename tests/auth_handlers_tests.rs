//! Full-router tests: real handlers and templates, a memory-backed session
//! layer, and a wiremock stand-in for the webhook backend.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use transvia::{
    auth,
    config::WebhookConfig,
    handlers,
    services::HttpWebhookClient,
    test_utils::test_helpers::issue_test_token,
    AppState,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer) -> Router {
    let state = AppState {
        webhook: Arc::new(HttpWebhookClient::new(WebhookConfig::new(server.uri()))),
        token_decoder: Arc::new(auth::token::TokenDecoder::new(None)),
    };

    let login_routes = Router::new()
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit_handler),
        )
        .layer(middleware::from_fn(
            auth::middleware::redirect_if_authenticated,
        ));

    let protected_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard_handler))
        .route("/admin", get(handlers::admin_page))
        .route("/admin/users", post(handlers::create_user_handler))
        .layer(middleware::from_fn(auth::middleware::require_auth));

    Router::new()
        .merge(login_routes)
        .route("/login/verify", post(handlers::verify_handler))
        .route("/login/resend", post(handlers::resend_handler))
        .route("/login/back", post(handlers::back_handler))
        .route("/logout", get(handlers::logout_handler))
        .merge(protected_routes)
        .layer(SessionManagerLayer::new(MemoryStore::default()))
        .with_state(state)
}

/// Carries the session cookie between requests the way a browser would.
#[derive(Default)]
struct Client {
    cookie: Option<String>,
}

impl Client {
    fn absorb_cookie(&mut self, response: &Response) {
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let value = set_cookie.to_str().expect("cookie is ascii");
            let pair = value.split(';').next().expect("cookie pair").to_string();
            self.cookie = Some(pair);
        }
    }

    async fn get(&mut self, app: &Router, uri: &str) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        self.absorb_cookie(&response);
        response
    }

    async fn post_form(&mut self, app: &Router, uri: &str, form: &str) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap();
        self.absorb_cookie(&response);
        response
    }
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn extract_csrf(html: &str) -> String {
    let re = Regex::new(r#"name="csrf_token" value="([^"]+)""#).unwrap();
    re.captures(html).expect("csrf token in page")[1].to_string()
}

fn redirect_target(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
}

/// Runs the credentials step against a mocked backend and returns the csrf
/// token for the verification step.
async fn login_to_verification(app: &Router, client: &mut Client, server: &MockServer) -> String {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": "Código enviado"
        })))
        .mount(server)
        .await;

    let response = client.get(app, "/login").await;
    assert_eq!(response.status(), StatusCode::OK);
    let csrf = extract_csrf(&body_text(response).await);

    let form = format!("email=ana@exemplo.com&senha=segredo&csrf_token={csrf}");
    let response = client.post_form(app, "/login", &form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Código enviado para seu email!"));
    assert!(html.contains("code-inputs"));
    extract_csrf(&html)
}

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let response = client.get(&app, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(redirect_target(&response), "/login");
}

#[tokio::test]
async fn invalid_fields_render_inline_errors_without_calling_the_backend() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let response = client.get(&app, "/login").await;
    let csrf = extract_csrf(&body_text(response).await);

    let form = format!("email=nao-eh-email&senha=&csrf_token={csrf}");
    let response = client.post_form(&app, "/login", &form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Digite um email válido"));
    assert!(html.contains("A senha é obrigatória"));
    // No webhook mock was mounted; any call would have failed loudly in the
    // rendered page instead of a field error.
    assert!(html.contains("nao-eh-email"));
}

#[tokio::test]
async fn wrong_csrf_token_is_forbidden() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    client.get(&app, "/login").await;
    let form = "email=ana@exemplo.com&senha=segredo&csrf_token=errado";
    let response = client.post_form(&app, "/login", form).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn full_login_reaches_the_dashboard() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;

    let token = issue_test_token(b"segredo", 3, "ana@exemplo.com", 2);
    Mock::given(method("POST"))
        .and(path("/v2f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jwttoken": token
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/embarcadoras"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "nome": "ACME Transportes" }
        ])))
        .mount(&server)
        .await;

    let form = format!("code=123456&csrf_token={csrf}");
    let response = client.post_form(&app, "/login/verify", &form).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(redirect_target(&response), "/dashboard");

    let response = client.get(&app, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("ACME Transportes"));
}

#[tokio::test]
async fn rejected_code_stays_on_the_verification_step() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;

    Mock::given(method("POST"))
        .and(path("/v2f"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "output": "Código inválido"
        })))
        .mount(&server)
        .await;

    let form = format!("code=111111&csrf_token={csrf}");
    let response = client.post_form(&app, "/login/verify", &form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Código inválido"));
    assert!(html.contains("code-inputs"));
}

#[tokio::test]
async fn resend_shows_the_new_code_message() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;

    let form = format!("csrf_token={csrf}");
    let response = client.post_form(&app, "/login/resend", &form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Novo código enviado!"));
}

#[tokio::test]
async fn back_returns_to_the_credentials_form() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;

    let form = format!("csrf_token={csrf}");
    let response = client.post_form(&app, "/login/back", &form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("name=\"senha\""));
    assert!(!html.contains("code-inputs"));
}

#[tokio::test]
async fn logged_in_users_skip_the_login_page() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;
    let token = issue_test_token(b"segredo", 3, "ana@exemplo.com", 2);
    Mock::given(method("POST"))
        .and(path("/v2f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jwttoken": token
        })))
        .mount(&server)
        .await;
    let form = format!("code=123456&csrf_token={csrf}");
    client.post_form(&app, "/login/verify", &form).await;

    let response = client.get(&app, "/login").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(redirect_target(&response), "/dashboard");
}

#[tokio::test]
async fn non_admins_are_sent_back_to_the_dashboard() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;
    let token = issue_test_token(b"segredo", 3, "ana@exemplo.com", 2);
    Mock::given(method("POST"))
        .and(path("/v2f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jwttoken": token
        })))
        .mount(&server)
        .await;
    let form = format!("code=123456&csrf_token={csrf}");
    client.post_form(&app, "/login/verify", &form).await;

    let response = client.get(&app, "/admin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(redirect_target(&response), "/dashboard");
}

#[tokio::test]
async fn admins_can_create_users() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;
    let token = issue_test_token(b"segredo", 1, "chefe@exemplo.com", 1);
    Mock::given(method("POST"))
        .and(path("/v2f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jwttoken": token
        })))
        .mount(&server)
        .await;
    let form = format!("code=123456&csrf_token={csrf}");
    client.post_form(&app, "/login/verify", &form).await;

    let response = client.get(&app, "/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let csrf = extract_csrf(&body_text(response).await);

    Mock::given(method("POST"))
        .and(path("/singup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": "Usuário criado com sucesso!"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let form = format!("email=novo@exemplo.com&senha=123456&cargo=2&csrf_token={csrf}");
    let response = client.post_form(&app, "/admin/users", &form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Usuário criado com sucesso!"));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;
    let token = issue_test_token(b"segredo", 3, "ana@exemplo.com", 2);
    Mock::given(method("POST"))
        .and(path("/v2f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jwttoken": token
        })))
        .mount(&server)
        .await;
    let form = format!("code=123456&csrf_token={csrf}");
    client.post_form(&app, "/login/verify", &form).await;

    let response = client.get(&app, "/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client.get(&app, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(redirect_target(&response), "/login");
}

#[tokio::test]
async fn dashboard_fetch_failure_renders_inline_error() {
    let server = MockServer::start().await;
    let app = app(&server);
    let mut client = Client::default();

    let csrf = login_to_verification(&app, &mut client, &server).await;
    let token = issue_test_token(b"segredo", 3, "ana@exemplo.com", 2);
    Mock::given(method("POST"))
        .and(path("/v2f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jwttoken": token
        })))
        .mount(&server)
        .await;
    let form = format!("code=123456&csrf_token={csrf}");
    client.post_form(&app, "/login/verify", &form).await;

    Mock::given(method("GET"))
        .and(path("/usuarios"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = client.get(&app, "/dashboard?tab=usuarios").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Erro ao carregar dados"));
    assert!(html.contains("Tentar novamente"));
}
