//! Webhook endpoint for push notifications.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::validate;
use gitpress_scheduler::{JobHandle, JobUpdate};

pub fn router() -> Router<AppState> {
    Router::new().route("/github", post(github_hook))
}

/// Handle a GitHub webhook delivery.
async fn github_hook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let event_type = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let signature = headers
            .get("X-Hub-Signature-256")
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, signature) {
            warn!(event = %event_type, "invalid webhook signature");
            return Err(ApiError::Unauthorized("bad signature".to_string()));
        }
    }

    match event_type {
        "ping" => {
            info!("ping received");
            Ok(Json(json!({ "ok": true, "msg": "pong" })).into_response())
        }
        "push" => {
            let payload: serde_json::Value = serde_json::from_slice(&body)
                .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))?;

            let event = validate::push_event(&payload, &state.config)?;
            info!(
                target_key = %event.target_key,
                revision = %event.revision,
                "push accepted"
            );

            let handle = state.controller.submit(event);
            let accepted = json!({ "ok": true, "job": handle.id().to_string() });
            tokio::spawn(log_lifecycle(handle));

            Ok((StatusCode::ACCEPTED, Json(accepted)).into_response())
        }
        other => {
            info!(event = %other, "ignoring event");
            Ok(StatusCode::OK.into_response())
        }
    }
}

/// Follow a submitted job and log how it ends.
async fn log_lifecycle(mut handle: JobHandle) {
    while let Some(update) = handle.next().await {
        match update {
            JobUpdate::Started => {
                info!(job = %handle.id(), target_key = %handle.target_key(), "build started");
            }
            JobUpdate::Completed => {
                info!(job = %handle.id(), target_key = %handle.target_key(), "build completed");
            }
            JobUpdate::Failed(err) => {
                warn!(
                    job = %handle.id(),
                    target_key = %handle.target_key(),
                    error = %err,
                    "build failed"
                );
            }
            JobUpdate::Aborted => {
                info!(job = %handle.id(), target_key = %handle.target_key(), "build superseded");
            }
        }
    }
}

/// Verify a GitHub `X-Hub-Signature-256` header.
fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> bool {
    let Some(signature) = signature else {
        return false;
    };
    let Some(sig_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return false;
    };

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take any size key");
    mac.update(body);

    mac.verify_slice(&sig_bytes).is_ok()
}
