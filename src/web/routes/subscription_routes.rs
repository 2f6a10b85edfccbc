use axum::{
    extract::{Path, Query, State},
    http::{
        header::{ACCEPT, LOCATION},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tracing::warn;
use utoipa::OpenApi;

use crate::db::entities::subscription;
use crate::db::services::{self, SumFilter};
use crate::period::DateRange;
use crate::web::extract::JsonOrForm;
use crate::web::models::{
    ErrorResponse, StatusResponse, SubscriptionRequest, SubscriptionSumQuery,
    SubscriptionSumResponse, CURRENCY,
};
use crate::web::{AppError, AppState};

fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .map_err(|_| AppError::InvalidInput(format!("Invalid subscription ID: {raw:?}")))
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// Trims a filter value the way stored fields are trimmed. Blank counts as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/",
    tag = "subscriptions",
    responses(
        (status = 200, description = "HTML page listing active subscriptions", body = String, content_type = "text/html"),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_handler(State(app_state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let subscriptions = services::list_subscriptions(&app_state.db_pool).await?;
    app_state
        .templates
        .render("list", &serde_json::json!({ "subs": subscriptions }))
}

/// Accepts a JSON body or an urlencoded form with the same fields.
#[utoipa::path(
    post,
    path = "/create-subscription",
    tag = "subscriptions",
    request_body(content = SubscriptionRequest, content_type = "application/json"),
    responses(
        (status = 302, description = "Created, redirects to the list page"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    JsonOrForm(payload): JsonOrForm<SubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    services::create_subscription(&app_state.db_pool, &payload.into())
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to create subscription."))?;
    Ok((StatusCode::FOUND, [(LOCATION, "/")]))
}

/// JSON with `Accept: application/json`, otherwise an HTML page.
#[utoipa::path(
    get,
    path = "/subscription/{id}",
    tag = "subscriptions",
    params(("id" = i32, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "The subscription", body = subscription::Model),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "No active subscription with this ID", body = ErrorResponse)
    )
)]
pub async fn read_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id)?;
    let subscription = services::get_subscription(&app_state.db_pool, id).await?;

    if wants_json(&headers) {
        return Ok(Json(subscription).into_response());
    }
    let page = app_state
        .templates
        .render("subscription", &serde_json::json!({ "s": subscription }))?;
    Ok(page.into_response())
}

#[utoipa::path(
    put,
    path = "/update-subscription/{id}",
    tag = "subscriptions",
    params(("id" = i32, Path, description = "Subscription ID")),
    request_body(content = SubscriptionRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Updated", body = StatusResponse),
        (status = 400, description = "Invalid input or ID", body = ErrorResponse),
        (status = 404, description = "No active subscription with this ID", body = ErrorResponse)
    )
)]
pub async fn update_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    JsonOrForm(payload): JsonOrForm<SubscriptionRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let id = parse_id(&raw_id)?;
    services::update_subscription(&app_state.db_pool, id, &payload.into())
        .await
        .inspect_err(|e| warn!(id, error = %e, "Failed to update subscription."))?;
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/delete-subscription/{id}",
    tag = "subscriptions",
    params(("id" = i32, Path, description = "Subscription ID")),
    responses(
        (status = 204, description = "Soft-deleted"),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "No active subscription with this ID", body = ErrorResponse)
    )
)]
pub async fn delete_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&raw_id)?;
    services::delete_subscription(&app_state.db_pool, id)
        .await
        .inspect_err(|e| warn!(id, error = %e, "Failed to delete subscription."))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/subscriptions/calculator",
    tag = "subscriptions",
    responses((status = 200, description = "HTML form for the total calculator", body = String, content_type = "text/html"))
)]
pub async fn calculator_form_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    app_state
        .templates
        .render("subscription_sum_form", &serde_json::json!({}))
}

#[utoipa::path(
    get,
    path = "/subscriptions/total",
    tag = "subscriptions",
    params(SubscriptionSumQuery),
    responses(
        (status = 200, description = "Sum of prices over the period", body = SubscriptionSumResponse),
        (status = 400, description = "Missing or malformed period", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn subscriptions_total_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SubscriptionSumQuery>,
) -> Result<Json<SubscriptionSumResponse>, AppError> {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let (Some(start_date), Some(end_date)) = (present(query.start_date), present(query.end_date))
    else {
        return Err(AppError::InvalidInput(
            "Both start_date and end_date (MM-YYYY) are required".to_string(),
        ));
    };
    let range = DateRange::parse(&start_date, &end_date)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let filter = SumFilter {
        range,
        user_id: non_empty(query.user_id),
        service_name: non_empty(query.service_name),
    };
    let total = services::sum_prices(&app_state.db_pool, &filter).await?;

    Ok(Json(SubscriptionSumResponse {
        total,
        currency: CURRENCY.to_string(),
        period: format!("{start_date} - {end_date}"),
        user_id: filter.user_id.unwrap_or_default(),
        service: filter.service_name.unwrap_or_default(),
    }))
}

// --- OpenAPI ---

#[derive(OpenApi)]
#[openapi(
    info(title = "Subscription service", description = "Tracks user subscriptions and sums their prices."),
    paths(
        list_handler,
        create_subscription_handler,
        read_subscription_handler,
        update_subscription_handler,
        delete_subscription_handler,
        calculator_form_handler,
        subscriptions_total_handler,
    ),
    components(schemas(
        subscription::Model,
        SubscriptionRequest,
        SubscriptionSumResponse,
        StatusResponse,
        ErrorResponse,
    )),
    tags((name = "subscriptions", description = "Subscription records and price totals"))
)]
pub struct SubscriptionApiDoc;

// --- Router ---

pub fn create_subscription_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_handler))
        .route("/create-subscription", post(create_subscription_handler))
        .route("/subscription/{id}", get(read_subscription_handler))
        .route("/update-subscription/{id}", put(update_subscription_handler))
        .route("/delete-subscription/{id}", delete(delete_subscription_handler))
        .route("/subscriptions/calculator", get(calculator_form_handler))
        .route("/subscriptions/total", get(subscriptions_total_handler))
}
