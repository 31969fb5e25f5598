//! HTTP gateway onto the bus.
//!
//! Lets out-of-process callers (the `sysconf-ctl` tool, scripts) submit
//! method calls. Calls go through the bus like any other caller's, so they
//! reach the coordinator only via the dispatcher.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use self::auth::gateway_auth_middleware;
pub use self::handlers::{CallRequest, CallResponse, GatewayState};
use self::handlers::{get_status, post_call};

pub fn setup_gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/bus/call", post(post_call))
        .layer(middleware::from_fn_with_state(state.clone(), gateway_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the gateway until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Gateway listening");

    axum::serve(listener, setup_gateway_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReloadMode;
    use crate::store::Store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(api_key: Option<&str>) -> GatewayState {
        let mut store = Store::default();
        store.insert_or_update("name", "demo", Some("General"));
        store.insert_or_update("port", "8080", Some("Network"));

        GatewayState {
            bus: crate::ipc::Bus::new(),
            coordinator: Arc::new(crate::reload::Coordinator::new(
                "/tmp/unused.conf",
                ReloadMode::Replace,
                store,
            )),
            service_name: "com.redhat.SystemService".into(),
            object_path: "/com/redhat/SystemService".into(),
            api_key: api_key.map(Arc::from),
        }
    }

    #[tokio::test]
    async fn status_is_open_without_key() {
        let response = setup_gateway_router(state(None))
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status["status"], "idle");
        assert_eq!(status["entries"], 2);
        assert_eq!(status["reload_mode"], "replace");
        assert_eq!(status["config_path"], "/tmp/unused.conf");
    }

    #[tokio::test]
    async fn wrong_key_rejected() {
        let app = setup_gateway_router(state(Some("secret")));

        let missing = app
            .clone()
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app
            .clone()
            .oneshot(
                Request::get("/status")
                    .header("Authorization", "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let right = app
            .oneshot(
                Request::get("/status")
                    .header("Authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(right.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn call_without_owner_is_not_found() {
        let response = setup_gateway_router(state(None))
            .oneshot(
                Request::post("/bus/call")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"interface":"com.redhat.SystemService","member":"LogConfig"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
