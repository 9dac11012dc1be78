use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use tracing::{debug, info};

use notifex_core::webhook::WebhookBody;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Only this event kind ever reaches the aggregation engine; everything
/// else is acknowledged and dropped here.
const LIBRARY_NEW: &str = "library.new";

pub async fn webhook(
    State(state): State<AppState>,
    Json(body): Json<WebhookBody>,
) -> AppResult<impl IntoResponse> {
    let event_name = body.event_name().unwrap_or("").to_string();
    if event_name != LIBRARY_NEW {
        info!(event = %event_name, "ignoring event");
        return Ok(Json(json!({
            "status": "ignored",
            "message": format!("Event {event_name} ignored"),
        })));
    }

    let Some(event) = body.normalize() else {
        return Err(AppError::internal("Failed to process notification"));
    };

    debug!(
        kind = %event.kind,
        title = %event.display_name(),
        "accepted library.new event"
    );
    state.aggregator.submit(event).await;

    Ok(Json(json!({
        "status": "success",
        "message": "Notification queued",
    })))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "telegram_configured": state.config.telegram.is_configured(),
    }))
}

pub async fn index() -> impl IntoResponse {
    Json(json!({
        "name": "notifex",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "webhook": "/webhook (POST)",
            "health": "/health (GET)",
        },
    }))
}
