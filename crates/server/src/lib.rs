//! HTTP front end for the employee attrition predictor
//!
//! Serves the prediction form, a JSON API over the same prediction path,
//! and health/metrics endpoints.

pub mod api;
pub mod config;
pub mod page;
