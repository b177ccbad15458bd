//! HTTP surface and bootstrap for a deviceShifu.
//!
//! [`new_device_shifu`] validates the configuration, builds the protocol
//! client and returns the instance together with an axum [`Router`]
//! exposing health, status and instruction endpoints.
//!
//! [`Router`]: axum::Router

pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod shifu;
pub mod startup;

pub use error::ShifuError;
pub use models::{ApiError, ApiResult, ErrorResponse};
pub use server::create_router;
pub use shifu::{DeviceShifu, DeviceStatus};
pub use startup::{ShifuDeps, ShifuMetadata, new_device_shifu};
