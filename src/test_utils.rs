pub mod test_helpers {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use std::sync::Arc;
    use tower_sessions::{MemoryStore, Session};

    use crate::models::User;

    /// A plain (non-admin) user for session and template tests.
    pub fn sample_user() -> User {
        User {
            id: 7,
            nome: Some("Ana".to_string()),
            email: "ana@exemplo.com".to_string(),
            tipo: 2,
            empresa_id: Some(12),
            transportadora_id: None,
            imagem_url: None,
        }
    }

    pub fn sample_admin() -> User {
        User {
            tipo: 1,
            ..sample_user()
        }
    }

    /// Signs a bearer token with the shape the backend issues. `role` maps to
    /// the user's `tipo`.
    pub fn issue_test_token(secret: &[u8], id: i64, email: &str, role: i64) -> String {
        let claims = json!({
            "id": id,
            "email": email,
            "role": role,
            "empresaId": 12,
        });

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("test token encodes")
    }

    /// An unsaved session backed by an in-memory store.
    pub fn memory_session() -> Session {
        let store = Arc::new(MemoryStore::default());
        Session::new(None, store, None)
    }
}
