// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod airports;
pub mod batch;
pub mod config;
pub mod deck;
pub mod features;
pub mod query;
pub mod route;
pub mod service;

use std::path::PathBuf;
use thiserror::Error;

pub use airports::{AirportIndex, AirportRecord};
pub use features::{CategoryPolicy, ColumnNaming, EncodedFeatures, FeatureEncoder, FeatureSchema};
pub use query::{Carrier, FlightQuery};
pub use route::{LatLon, MapConfig, RouteGeometry};
pub use service::{FlightReport, FlightStatusService};

#[derive(Error, Debug)]
pub enum FspError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Model error: {0}")]
    Model(#[from] fsp_model::ModelError),
    #[error("Unknown carrier code '{0}'")]
    UnknownCarrier(String),
    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("Duplicate schema column '{0}'")]
    DuplicateColumn(String),
    #[error("No schema column '{column}' for {kind} '{value}'")]
    UnmatchedCategory {
        kind: features::CategoryKind,
        value: String,
        column: String,
    },
    #[error("Could not find coordinates for: {}", .0.join(", "))]
    AirportsNotFound(Vec<String>),
    #[error("Schema does not match the model: {0}")]
    SchemaMismatch(String),
}

/// Per-user configuration directory, falling back to the working directory.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "fsp", "Flight-Status-Predictor")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
