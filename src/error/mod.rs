// src/error/mod.rs
pub mod types;

pub use types::{
    AppError, AppResult, GatewayError, GatewayResult, SaveError, UNKNOWN_ERROR_DETAIL,
};
