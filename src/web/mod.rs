use axum::{http::Method, routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::routes::subscription_routes::{self, SubscriptionApiDoc};
use crate::web::templates::Templates;

pub use crate::web::error::AppError;

pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod templates;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub templates: Templates,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(db_pool: DatabaseConnection, templates: Templates) -> Router {
    let app_state = Arc::new(AppState { db_pool, templates });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .merge(subscription_routes::create_subscription_router())
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", SubscriptionApiDoc::openapi()))
        .with_state(app_state)
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::web::models::SubscriptionSumResponse;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn test_router() -> Router {
        create_axum_router(test_connection().await, Templates::load().unwrap())
    }

    async fn send(router: &Router, request: Request<Body>) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_json(body: serde_json::Value) -> Request<Body> {
        Request::post("/create-subscription")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = test_router().await;
        let response = send(&router, get("/api/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_redirects_and_accepts_forms() {
        let router = test_router().await;

        let response = send(
            &router,
            create_json(serde_json::json!({
                "service_name": "Netflix", "price": 100, "user_id": "u1", "start_date": "03-2024"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let form = Request::post("/create-subscription")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "service_name=Spotify&price=50&user_id=u1&start_date=03-2024",
            ))
            .unwrap();
        assert_eq!(send(&router, form).await.status(), StatusCode::FOUND);

        let list = send(&router, get("/")).await;
        assert_eq!(list.status(), StatusCode::OK);
        let bytes = list.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Netflix"));
        assert!(html.contains("Spotify"));
    }

    #[tokio::test]
    async fn test_create_with_non_positive_price_is_bad_request() {
        let router = test_router().await;
        let response = send(
            &router,
            create_json(serde_json::json!({
                "service_name": "Netflix", "price": 0, "user_id": "u1", "start_date": "03-2024"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("positive"));
    }

    #[tokio::test]
    async fn test_read_update_delete_lifecycle() {
        let router = test_router().await;
        send(
            &router,
            create_json(serde_json::json!({
                "service_name": "Netflix", "price": 100, "user_id": "u1", "start_date": "01-2024"
            })),
        )
        .await;

        let read = Request::get("/subscription/1")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();
        let record = body_json(send(&router, read).await).await;
        assert_eq!(record["end_time"], "01-2025");

        let html = send(&router, get("/subscription/1")).await;
        assert_eq!(html.status(), StatusCode::OK);

        let update = Request::put("/update-subscription/1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({
                    "service_name": "Netflix", "price": 150, "user_id": "u1",
                    "start_date": "06-2024", "end_time": "01-1999"
                })
                .to_string(),
            ))
            .unwrap();
        let response = send(&router, update).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "success");

        let read = Request::get("/subscription/1")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();
        let record = body_json(send(&router, read).await).await;
        assert_eq!(record["price"], 150);
        assert_eq!(record["end_time"], "06-2025");

        let delete = || Request::delete("/delete-subscription/1").body(Body::empty()).unwrap();
        assert_eq!(send(&router, delete()).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(send(&router, delete()).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            send(&router, get("/subscription/1")).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let router = test_router().await;
        assert_eq!(
            send(&router, get("/subscription/abc")).await.status(),
            StatusCode::BAD_REQUEST
        );
        let delete = Request::delete("/delete-subscription/1x").body(Body::empty()).unwrap();
        assert_eq!(send(&router, delete).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let router = test_router().await;
        let update = Request::put("/update-subscription/99")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({
                    "service_name": "Netflix", "price": 150, "user_id": "u1", "start_date": "06-2024"
                })
                .to_string(),
            ))
            .unwrap();
        assert_eq!(send(&router, update).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_total_filters_and_echoes_query() {
        let router = test_router().await;
        for (service, price, user) in [("Netflix", 100, "u1"), ("Spotify", 50, "u1"), ("Netflix", 200, "u2")] {
            send(
                &router,
                create_json(serde_json::json!({
                    "service_name": service, "price": price, "user_id": user, "start_date": "03-2024"
                })),
            )
            .await;
        }

        let response = send(
            &router,
            get("/subscriptions/total?user_id=u1&service_name=Netflix&start_date=01-2024&end_date=12-2024"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let result: SubscriptionSumResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            result,
            SubscriptionSumResponse {
                total: 100,
                currency: "RUB".to_string(),
                period: "01-2024 - 12-2024".to_string(),
                user_id: "u1".to_string(),
                service: "Netflix".to_string(),
            }
        );

        let response = send(
            &router,
            get("/subscriptions/total?user_id=&start_date=01-2025&end_date=12-2025"),
        )
        .await;
        assert_eq!(body_json(response).await["total"], 0);
    }

    #[tokio::test]
    async fn test_total_matches_padded_values_used_on_create() {
        let router = test_router().await;
        send(
            &router,
            create_json(serde_json::json!({
                "service_name": " Netflix ", "price": 100, "user_id": " u1 ", "start_date": "03-2024"
            })),
        )
        .await;

        let response = send(
            &router,
            get("/subscriptions/total?user_id=%20u1%20&service_name=%20Netflix%20&start_date=01-2024&end_date=12-2024"),
        )
        .await;
        let result = body_json(response).await;
        assert_eq!(result["total"], 100);
        assert_eq!(result["user_id"], "u1");
        assert_eq!(result["service"], "Netflix");
    }

    #[tokio::test]
    async fn test_total_requires_valid_period() {
        let router = test_router().await;
        for uri in [
            "/subscriptions/total?start_date=01-2024",
            "/subscriptions/total?start_date=01-2024&end_date=",
            "/subscriptions/total?start_date=13-2024&end_date=12-2024",
        ] {
            assert_eq!(send(&router, get(uri)).await.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_openapi_document_lists_every_route() {
        let router = test_router().await;
        let response = send(&router, get("/api-docs/openapi.json")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let doc = body_json(response).await;
        for path in [
            "/",
            "/create-subscription",
            "/subscription/{id}",
            "/update-subscription/{id}",
            "/delete-subscription/{id}",
            "/subscriptions/calculator",
            "/subscriptions/total",
        ] {
            assert!(doc["paths"][path].is_object(), "{path} missing from OpenAPI paths");
        }
        assert!(doc["components"]["schemas"]["Subscription"].is_object());

        let ui = send(&router, get("/swagger/")).await;
        assert_eq!(ui.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_calculator_form_renders() {
        let router = test_router().await;
        assert_eq!(
            send(&router, get("/subscriptions/calculator")).await.status(),
            StatusCode::OK
        );
    }
}
