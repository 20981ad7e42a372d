//! Faculty workload stress detection.
//!
//! A deterministic Workload Stress Score (WSS) rule engine, dataset
//! preprocessing that reconciles workload tables with the nine-attribute
//! schema, a class-balanced tree ensemble trained to reproduce the rule
//! categories, and a prediction interface that reports both side by side.

pub mod config;
pub mod dataset;
pub mod error;
pub mod ml;
pub mod models;
pub mod prediction;
pub mod scoring;

pub use error::{AppError, Result};
pub use models::{Attribute, StressCategory, WorkloadRecord, Wss};
pub use prediction::{PredictionContext, PredictionResult};
