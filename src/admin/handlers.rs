use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ReloadMode;
use crate::ipc::{Bus, BusError, MethodCall};
use crate::reload::{Coordinator, CoordinatorState};

/// State shared by the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub bus: Bus,
    pub coordinator: Arc<Coordinator>,
    pub service_name: String,
    pub object_path: String,
    pub api_key: Option<Arc<str>>,
}

/// Body of `POST /bus/call`. Destination and path default to this service.
#[derive(Debug, Deserialize, Serialize)]
pub struct CallRequest {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    pub interface: String,
    pub member: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CallResponse {
    pub reply: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub entries: usize,
    pub reload_mode: ReloadMode,
    pub config_path: String,
}

/// Reads only the coordinator's atomics, so it answers during a reload.
pub async fn get_status(State(state): State<GatewayState>) -> Json<SystemStatus> {
    let status = match state.coordinator.state() {
        CoordinatorState::Idle => "idle",
        CoordinatorState::Reloading => "reloading",
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status,
        entries: state.coordinator.entry_count(),
        reload_mode: state.coordinator.mode(),
        config_path: state.coordinator.path().display().to_string(),
    })
}

pub async fn post_call(
    State(state): State<GatewayState>,
    Json(request): Json<CallRequest>,
) -> Result<Json<CallResponse>, (StatusCode, Json<ErrorBody>)> {
    let call = MethodCall::new(
        request.destination.unwrap_or_else(|| state.service_name.clone()),
        request.path.unwrap_or_else(|| state.object_path.clone()),
        request.interface,
        request.member,
    );
    tracing::debug!(?call, "Forwarding gateway call");

    match state.bus.call(call).await {
        Ok(reply) => Ok(Json(CallResponse { reply: reply.into_body() })),
        Err(e) => {
            let status = match e {
                BusError::ServiceUnknown(_) | BusError::UnknownMethod { .. } => StatusCode::NOT_FOUND,
                BusError::NoReply(_) => StatusCode::SERVICE_UNAVAILABLE,
                BusError::NameTaken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(ErrorBody { error: e.to_string() })))
        }
    }
}
