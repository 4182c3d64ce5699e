//! Anomaly service: scheduled detection passes plus health/metrics endpoints

pub mod api;
pub mod config;
