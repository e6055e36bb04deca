//! # Credential Routes
//!
//! Routes:
//! - POST /enroll: prove knowledge of a key and store the credential
//! - POST /verify: check a re-derived key against the stored proof
//! - GET  /retrieve?username=: stored proof (hex) and helper payload

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use ppba_prover::VerifyOutcome;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, validate_identity, Validate};
use crate::state::AppState;

/// One helper array as produced by the biometric extractor. Only the shape of
/// the JSON is checked; the payload is stored exactly as received.
#[derive(Debug, Serialize, Deserialize)]
pub struct HelperEntry {
    /// Base64 of the raw array buffer.
    pub data: String,
    pub shape: Vec<usize>,
    pub dtype: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    #[serde(alias = "identity")]
    pub username: String,
    pub key: String,
    pub helper: Box<RawValue>,
}

impl Validate for EnrollRequest {
    fn validate(&self) -> Result<(), String> {
        validate_identity(&self.username)?;
        let entries: Vec<HelperEntry> = serde_json::from_str(self.helper.get())
            .map_err(|e| format!("invalid helper payload: {e}"))?;
        if entries.iter().any(|entry| entry.dtype.trim().is_empty()) {
            return Err("invalid helper payload: dtype must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub username: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(alias = "identity")]
    pub username: String,
    pub key: String,
}

impl Validate for VerifyRequest {
    fn validate(&self) -> Result<(), String> {
        validate_identity(&self.username)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveQuery {
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrieveResponse {
    /// Serialized proof, lowercase hex.
    pub proof: String,
    /// Helper payload as enrolled (a JSON document in a string).
    pub helper: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll))
        .route("/verify", post(verify))
        .route("/retrieve", get(retrieve))
}

async fn enroll(
    State(state): State<AppState>,
    body: Result<Json<EnrollRequest>, JsonRejection>,
) -> Result<Json<EnrollResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let helper = req.helper.get().as_bytes().to_vec();

    let username = state.service.enroll(req.username, &req.key, helper).await?;

    Ok(Json(EnrollResponse {
        username,
        status: "success".to_string(),
    }))
}

async fn verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let req = extract_validated_json(body)?;

    match state.service.verify(&req.username, &req.key).await? {
        VerifyOutcome::Verified => Ok(Json(VerifyResponse {
            status: "verified".to_string(),
        })),
        VerifyOutcome::Rejected => Err(AppError::AccessDenied(format!(
            "verification failed for user {}",
            req.username
        ))),
    }
}

async fn retrieve(
    State(state): State<AppState>,
    query: Result<Query<RetrieveQuery>, QueryRejection>,
) -> Result<Json<RetrieveResponse>, AppError> {
    let username = extract_query(query)?
        .username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("username query param required".to_string()))?;

    let record = state.service.retrieve(&username).await?;

    Ok(Json(RetrieveResponse {
        proof: hex::encode(&record.proof),
        helper: String::from_utf8_lossy(&record.helper).into_owned(),
    }))
}
