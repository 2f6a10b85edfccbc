use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "subscriptions")]
#[schema(as = Subscription)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start_date: String, // MM-YYYY, as supplied by the client
    pub end_time: String,   // MM-YYYY, start_date + 12 months
    #[schema(value_type = String, format = DateTime)]
    pub created_at: ChronoDateTimeUtc, // first instant of start_date
    #[schema(value_type = String, format = DateTime)]
    pub ended: ChronoDateTimeUtc,      // created_at + 1 year
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: ChronoDateTimeUtc,
    #[sea_orm(indexed, nullable)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deleted_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
