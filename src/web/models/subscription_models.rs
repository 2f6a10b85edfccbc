use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::services::SubscriptionInput;

/// Currency reported by the price aggregation.
pub const CURRENCY: &str = "RUB";

/// Body of create and update requests. Missing fields fall back to empty values
/// and are rejected by validation.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct SubscriptionRequest {
    #[schema(example = "Netflix")]
    pub service_name: String,
    /// Whole currency units, must be positive.
    #[schema(example = 400)]
    pub price: i64,
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    /// `MM-YYYY`
    #[schema(example = "07-2025")]
    pub start_date: String,
}

impl From<SubscriptionRequest> for SubscriptionInput {
    fn from(request: SubscriptionRequest) -> Self {
        SubscriptionInput {
            service_name: request.service_name,
            price: request.price,
            user_id: request.user_id,
            start_date: request.start_date,
        }
    }
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubscriptionSumQuery {
    /// Only subscriptions of this user.
    pub user_id: Option<String>,
    /// Only subscriptions of this service.
    pub service_name: Option<String>,
    /// Required, `MM-YYYY`.
    pub start_date: Option<String>,
    /// Required, `MM-YYYY`, inclusive.
    pub end_date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, ToSchema)]
pub struct SubscriptionSumResponse {
    pub total: i64,
    pub currency: String,
    pub period: String,
    pub user_id: String,
    pub service: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
