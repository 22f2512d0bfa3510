use crate::map::SceneMap;
use crate::metrics;
use crate::session::SharedSession;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

#[derive(Clone)]
struct AppState {
    session: SharedSession<SceneMap>,
}

pub fn create_router(session: SharedSession<SceneMap>) -> Router {
    let state = AppState { session };

    Router::new()
        .route("/api/v1/scene", get(get_scene))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn get_scene(State(state): State<AppState>) -> Response {
    let session = state.session.read().await;
    Json(session.scene()).into_response()
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    #[tokio::test]
    async fn test_scene_before_first_cycle() {
        let app = create_router(Session::shared(false));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let response = reqwest::get(format!("http://{}/api/v1/scene", addr))
            .await
            .unwrap();
        assert!(response.status().is_success());

        let scene: serde_json::Value = response.json().await.unwrap();
        assert_eq!(scene["phase"], "uninitialized");
        assert!(scene["map"].is_null());
        assert_eq!(scene["table"], serde_json::json!([]));
        assert_eq!(scene["alerts"]["state"], "items");
    }
}
