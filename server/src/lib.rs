//! # ppba-server: Biometric Credential Service
//!
//! HTTP surface over the key commitment protocol in `ppba-prover`.
//! A user's biometric-derived key is never stored; the service keeps a
//! Groth16 proof of knowledge of a key hashing to a public commitment, plus
//! the opaque helper data the client needs to re-derive that key.
//!
//! ## API Surface
//!
//! | Route                 | Module              |
//! |-----------------------|---------------------|
//! | `POST /enroll`        | [`routes`]          |
//! | `POST /verify`        | [`routes`]          |
//! | `GET  /retrieve`      | [`routes`]          |
//! | `GET  /health/*`      | this module         |
//!
//! ## Crate Policy
//!
//! - Handlers delegate to [`service::CredentialService`].
//! - All errors map to structured HTTP responses via [`AppError`].
//! - Key material and the compiled relation are loaded once and shared.

pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::AppError;
pub use state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState, body_limit: usize) -> Router {
    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(routes::router())
        .merge(health)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health/liveness: the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness: the credential store answers.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state
        .service
        .store()
        .ping()
        .await
        .map_err(|e| AppError::ServiceUnavailable(e.to_string()))?;
    Ok("ready")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::service::tests::shared_keys;
    use crate::service::CredentialService;
    use crate::store::MemoryCredentialStore;

    fn test_app() -> Router {
        let service = CredentialService::new(shared_keys(), Arc::new(MemoryCredentialStore::new()));
        app(AppState::new(service), 1024)
    }

    #[tokio::test]
    async fn health_probes_answer() {
        for uri in ["/health/liveness", "/health/readiness"] {
            let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let resp = test_app().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let helper = format!(r#"[{{"data":"{}","shape":[1],"dtype":"uint8"}}]"#, "A".repeat(4096));
        let body = format!(r#"{{"username":"alice","key":"2a","helper":{helper}}}"#);
        let req = Request::builder()
            .method("POST")
            .uri("/enroll")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = test_app().oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }
}
