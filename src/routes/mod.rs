use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI JSON.
pub mod docs;
/// Game and content routes.
pub mod game;
/// Health check route.
pub mod health;
/// Account session middleware.
pub mod session;
/// Change feed route.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router(state.clone()))
        .merge(game::router(state.clone()));

    api_router.merge(docs::router()).with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig, routes::session::ACCOUNT_HEADER, services::memory_state,
        state::AppState,
    };

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCOUNT_HEADER, "alice");
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn test_app() -> Router {
        let (state, _store) = memory_state().await;
        router(state)
    }

    #[tokio::test]
    async fn missing_account_header_is_unauthorized() {
        let app = test_app().await;
        let response = app
            .oneshot(Request::builder().uri("/game").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn healthcheck_reports_degraded_without_store() {
        let app = router(AppState::new(AppConfig::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthcheck")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "degraded");
    }

    #[tokio::test]
    async fn game_routes_are_unavailable_in_degraded_mode() {
        let app = router(AppState::new(AppConfig::default()));
        let (status, body) = send(&app, "GET", "/game", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("degraded"));
    }

    #[tokio::test]
    async fn first_request_initializes_the_game() {
        let app = test_app().await;

        let (status, first) = send(&app, "GET", "/game", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["name"], "Default Game");
        assert_eq!(first["abilities"], json!([]));

        let (_, second) = send(&app, "GET", "/game", None).await;
        assert_eq!(first["id"], second["id"]);

        let (status, rule_book) = send(&app, "GET", "/game/rulebook", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rule_book["content"], "Default Rule Book");
    }

    #[tokio::test]
    async fn create_edit_and_delete_through_http() {
        let app = test_app().await;

        let (status, created) = send(
            &app,
            "POST",
            "/game/characters",
            Some(json!({"name": "Knight"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["kind"], "character");
        assert_eq!(created["stats"]["health"], 20);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            "PATCH",
            &format!("/game/characters/{id}"),
            Some(json!({"write": {"field": "stat", "value": {"stat": "health", "value": 42}}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["stats"]["health"], 42);

        let (status, details) = send(&app, "GET", &format!("/game/characters/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["record"]["stats"]["health"], 42);

        let (status, _) = send(&app, "DELETE", &format!("/game/characters/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/game/characters/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn record_is_only_reachable_through_its_collection() {
        let app = test_app().await;
        let (_, created) = send(&app, "POST", "/game/abilities", Some(json!({}))).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "GET", &format!("/game/monsters/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected() {
        let app = test_app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/game/monsters",
            Some(json!({"type": "dragon"})),
        )
        .await;
        assert!(status.is_client_error());

        let (status, _) = send(&app, "POST", "/game/abilities", Some(json!({"name": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "PUT", "/game/name", Some(json!({"name": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, ability) = send(&app, "POST", "/game/abilities", Some(json!({}))).await;
        let id = ability["id"].as_str().unwrap().to_string();
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/game/abilities/{id}"),
            Some(json!({"write": {"field": "money_drop", "value": 3}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("money_drop"));
    }

    #[tokio::test]
    async fn links_report_dangling_targets() {
        let app = test_app().await;
        let (_, staff) = send(
            &app,
            "POST",
            "/game/equipment",
            Some(json!({"name": "Staff", "type": "weapon"})),
        )
        .await;
        let (_, monster) = send(&app, "POST", "/game/monsters", Some(json!({"type": "boss"}))).await;
        let staff = staff["id"].as_str().unwrap().to_string();
        let monster = monster["id"].as_str().unwrap().to_string();

        let (status, linked) = send(
            &app,
            "PUT",
            &format!("/game/monsters/{monster}/links/drops/{staff}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(linked["drops"][&staff]["drop_rate"], 0.5);

        send(&app, "DELETE", &format!("/game/equipment/{staff}"), None).await;

        let (_, details) = send(&app, "GET", &format!("/game/monsters/{monster}"), None).await;
        assert_eq!(details["links"][0]["target"], staff);
        assert_eq!(details["links"][0]["status"], "dangling");
    }
}
