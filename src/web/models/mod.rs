pub mod subscription_models;

pub use subscription_models::*;
