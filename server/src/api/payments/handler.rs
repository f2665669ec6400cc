//! Gateway webhook handler
//!
//! Signature verification happens over the raw request body, before any
//! JSON parsing, so the extractor order here matters.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::core::ServerState;
use crate::security_log;
use crate::services::gateway::{self, SIGNATURE_HEADER, WebhookEvent, WebhookOutcome};
use crate::utils::{AppError, AppResult};

#[derive(Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// POST /api/payments/webhook
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::invalid_token("Missing webhook signature"))?;

    if !gateway::verify_signature(&state.config.webhook_secret, &body, signature) {
        security_log!("WARN", "webhook_bad_signature", header = signature.to_string());
        return Err(AppError::invalid_token("Invalid webhook signature"));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid webhook payload: {e}")))?;

    let status = match gateway::process_event(&state.db, event).await? {
        WebhookOutcome::Processed => "processed",
        WebhookOutcome::AlreadyProcessed => "already_processed",
        WebhookOutcome::Ignored => "ignored",
    };
    Ok(Json(WebhookAck { status }))
}
