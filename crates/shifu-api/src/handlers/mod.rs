//! HTTP handlers.

pub mod basic;
pub mod devices;

use std::sync::Arc;

use crate::shifu::DeviceShifu;

/// State shared by every handler.
pub type ShifuState = Arc<DeviceShifu>;
