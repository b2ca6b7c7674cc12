//! Client for the EarthSense inference service.
//!
//! This crate provides:
//! - Single and batch image submission over multipart HTTP
//! - Health probing, one-shot or periodic
//! - Typed failures that separate validation, transport and decode errors

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod types;


pub use client::{InferenceApi, InferenceClient};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ClientError, ClientResult, FailureKind};
pub use health::{BackendStatus, HealthMonitor};
