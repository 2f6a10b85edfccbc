use chrono::Utc;
use sea_orm::{
    prelude::Expr, sea_query::Func, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::db::entities::subscription;
use crate::period::{DateRange, InvalidDateFormat, SubscriptionTerm};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidDateFormat(#[from] InvalidDateFormat),
    #[error("Price must be a positive integer, got {0}")]
    InvalidPrice(i64),
    #[error("Field `{0}` must not be empty")]
    MissingField(&'static str),
    #[error("Subscription {0} not found")]
    NotFound(i32),
    #[error("Storage failure: {0}")]
    Storage(#[from] DbErr),
}

/// Client-supplied fields of a subscription, shared by create and update.
#[derive(Debug, Clone)]
pub struct SubscriptionInput {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: String,
}

/// Validated input with its derived term, ready to be written.
struct ValidatedSubscription {
    service_name: String,
    price: i32,
    user_id: String,
    start_date: String,
    term: SubscriptionTerm,
}

fn validate(input: &SubscriptionInput) -> Result<ValidatedSubscription, ServiceError> {
    let service_name = input.service_name.trim();
    if service_name.is_empty() {
        return Err(ServiceError::MissingField("service_name"));
    }
    let user_id = input.user_id.trim();
    if user_id.is_empty() {
        return Err(ServiceError::MissingField("user_id"));
    }
    let price = i32::try_from(input.price)
        .ok()
        .filter(|price| *price > 0)
        .ok_or(ServiceError::InvalidPrice(input.price))?;
    let term = SubscriptionTerm::from_start_date(&input.start_date)?;

    Ok(ValidatedSubscription {
        service_name: service_name.to_string(),
        price,
        user_id: user_id.to_string(),
        start_date: input.start_date.clone(),
        term,
    })
}

/// Active (not soft-deleted) rows only.
fn active() -> sea_orm::Select<subscription::Entity> {
    subscription::Entity::find().filter(subscription::Column::DeletedAt.is_null())
}

pub async fn create_subscription(
    db: &DatabaseConnection,
    input: &SubscriptionInput,
) -> Result<subscription::Model, ServiceError> {
    let valid = validate(input)?;

    let active_model = subscription::ActiveModel {
        id: NotSet,
        service_name: Set(valid.service_name),
        price: Set(valid.price),
        user_id: Set(valid.user_id),
        start_date: Set(valid.start_date),
        end_time: Set(valid.term.end_time),
        created_at: Set(valid.term.created_at),
        ended: Set(valid.term.ended),
        updated_at: Set(Utc::now()),
        deleted_at: Set(None),
    };
    let model = active_model.insert(db).await?;
    info!(id = model.id, service = %model.service_name, "Subscription created.");
    Ok(model)
}

pub async fn get_subscription(
    db: &DatabaseConnection,
    id: i32,
) -> Result<subscription::Model, ServiceError> {
    active()
        .filter(subscription::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound(id))
}

pub async fn list_subscriptions(db: &DatabaseConnection) -> Result<Vec<subscription::Model>, DbErr> {
    active().order_by_asc(subscription::Column::Id).all(db).await
}

/// Overwrites every client field of an active subscription and re-derives its term.
pub async fn update_subscription(
    db: &DatabaseConnection,
    id: i32,
    input: &SubscriptionInput,
) -> Result<(), ServiceError> {
    let valid = validate(input)?;

    let result = subscription::Entity::update_many()
        .col_expr(subscription::Column::ServiceName, Expr::value(valid.service_name))
        .col_expr(subscription::Column::Price, Expr::value(valid.price))
        .col_expr(subscription::Column::UserId, Expr::value(valid.user_id))
        .col_expr(subscription::Column::StartDate, Expr::value(valid.start_date))
        .col_expr(subscription::Column::EndTime, Expr::value(valid.term.end_time))
        .col_expr(subscription::Column::CreatedAt, Expr::value(valid.term.created_at))
        .col_expr(subscription::Column::Ended, Expr::value(valid.term.ended))
        .col_expr(subscription::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(subscription::Column::Id.eq(id))
        .filter(subscription::Column::DeletedAt.is_null())
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(id));
    }
    info!(id, "Subscription updated.");
    Ok(())
}

/// Marks an active subscription as deleted. Deleting twice reports `NotFound`.
pub async fn delete_subscription(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let result = subscription::Entity::update_many()
        .col_expr(subscription::Column::DeletedAt, Expr::value(Some(Utc::now())))
        .filter(subscription::Column::Id.eq(id))
        .filter(subscription::Column::DeletedAt.is_null())
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(id));
    }
    info!(id, "Subscription soft-deleted.");
    Ok(())
}

/// Conjunctive filter for the price aggregation.
#[derive(Debug, Clone)]
pub struct SumFilter {
    pub range: DateRange,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

/// Sums prices of active subscriptions whose start falls inside the range.
/// An empty selection sums to zero.
pub async fn sum_prices(db: &DatabaseConnection, filter: &SumFilter) -> Result<i64, DbErr> {
    let mut query = active()
        .select_only()
        .column_as(
            Expr::expr(Func::sum(Expr::col(subscription::Column::Price))),
            "total",
        )
        .filter(subscription::Column::CreatedAt.between(filter.range.begin, filter.range.end));

    if let Some(user_id) = &filter.user_id {
        query = query.filter(subscription::Column::UserId.eq(user_id.as_str()));
    }
    if let Some(service_name) = &filter.service_name {
        query = query.filter(subscription::Column::ServiceName.eq(service_name.as_str()));
    }

    let total = query
        .into_tuple::<Option<i64>>()
        .one(db)
        .await?
        .flatten()
        .unwrap_or(0);
    debug!(?filter, total, "Computed subscription price sum.");
    Ok(total)
}
