// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! One-hot feature vectors in the exact column order the classifier was
//! trained with.
//!
//! Every column starts at 0. Date fields and the flight number are written
//! as raw integers; the carrier and origin (and optionally destination)
//! indicators are set to 1 only when a column with the expected name exists.
//! A category without a column is reported in
//! [`EncodedFeatures::unmatched`] and, under [`CategoryPolicy::Strict`],
//! rejected.

use crate::query::{Carrier, FlightQuery};
use crate::FspError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Ordered column names of the model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new<I, S>(columns: I) -> Result<Self, FspError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if index.insert(col.clone(), i).is_some() {
                return Err(FspError::DuplicateColumn(col.clone()));
            }
        }
        Ok(Self { columns, index })
    }

    /// Reads a JSON array of column names.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FspError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let columns: Vec<String> = serde_json::from_str(&content)?;
        log::debug!(
            "[Features] Loaded schema from {} ({} columns)",
            path.as_ref().display(),
            columns.len()
        );
        Self::new(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }
}

/// Column names used for each encoded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNaming {
    pub year: String,
    pub month: String,
    pub day_of_month: String,
    pub day_of_week: String,
    pub flight_number: String,
    pub carrier_prefix: String,
    pub origin_prefix: String,
    pub destination_prefix: Option<String>,
}

impl Default for ColumnNaming {
    fn default() -> Self {
        Self::generic()
    }
}

impl ColumnNaming {
    pub fn generic() -> Self {
        Self {
            year: "year".to_string(),
            month: "month".to_string(),
            day_of_month: "day".to_string(),
            day_of_week: "day_of_week".to_string(),
            flight_number: "flight_number".to_string(),
            carrier_prefix: "carrier_indicator_".to_string(),
            origin_prefix: "origin_indicator_".to_string(),
            destination_prefix: None,
        }
    }

    /// Column names of the BTS on-time performance extract the model is
    /// trained on.
    pub fn bts() -> Self {
        Self {
            year: "year".to_string(),
            month: "month".to_string(),
            day_of_month: "day_of_month".to_string(),
            day_of_week: "day_of_week".to_string(),
            flight_number: "op_carrier_fl_num".to_string(),
            carrier_prefix: "op_unique_carrier_".to_string(),
            origin_prefix: "origin_".to_string(),
            destination_prefix: None,
        }
    }

    pub fn carrier_column(&self, carrier: Carrier) -> String {
        format!("{}{}", self.carrier_prefix, carrier.code())
    }

    pub fn origin_column(&self, origin: &str) -> String {
        format!("{}{}", self.origin_prefix, origin)
    }

    pub fn destination_column(&self, destination: &str) -> Option<String> {
        self.destination_prefix
            .as_ref()
            .map(|p| format!("{}{}", p, destination))
    }

    /// Numeric columns only; what a schema holds before any one-hot columns
    /// are appended.
    pub fn numeric_columns(&self) -> Vec<String> {
        vec![
            self.year.clone(),
            self.month.clone(),
            self.day_of_month.clone(),
            self.day_of_week.clone(),
            self.flight_number.clone(),
        ]
    }

    /// The first preset whose numeric columns all appear in `schema`.
    pub fn detect(schema: &FeatureSchema) -> Option<Self> {
        [Self::generic(), Self::bts()]
            .into_iter()
            .find(|naming| naming.numeric_columns().iter().all(|c| schema.contains(c)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryPolicy {
    /// Leave all indicators at 0 and carry on.
    #[default]
    Lenient,
    /// Refuse to encode a query whose category has no column.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Carrier,
    Origin,
    Destination,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Carrier => write!(f, "carrier"),
            CategoryKind::Origin => write!(f, "origin"),
            CategoryKind::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedCategory {
    pub kind: CategoryKind,
    pub value: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatures {
    pub values: Vec<f32>,
    pub unmatched: Vec<UnmatchedCategory>,
}

impl EncodedFeatures {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_fully_matched(&self) -> bool {
        self.unmatched.is_empty()
    }

    /// Value for a named column.
    pub fn get(&self, schema: &FeatureSchema, column: &str) -> Option<f32> {
        schema.position(column).and_then(|i| self.values.get(i).copied())
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    naming: ColumnNaming,
    policy: CategoryPolicy,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema, naming: ColumnNaming, policy: CategoryPolicy) -> Self {
        Self {
            schema,
            naming,
            policy,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn naming(&self) -> &ColumnNaming {
        &self.naming
    }

    pub fn policy(&self) -> CategoryPolicy {
        self.policy
    }

    /// Numeric columns of the naming that the schema has no slot for.
    /// Those fields never reach the model.
    pub fn missing_numeric_columns(&self) -> Vec<String> {
        self.naming
            .numeric_columns()
            .into_iter()
            .filter(|c| !self.schema.contains(c))
            .collect()
    }

    pub fn encode(&self, query: &FlightQuery) -> Result<EncodedFeatures, FspError> {
        let mut values = vec![0.0f32; self.schema.len()];

        let numeric = [
            (&self.naming.year, query.year() as f32),
            (&self.naming.month, query.month() as f32),
            (&self.naming.day_of_month, query.day_of_month() as f32),
            (&self.naming.day_of_week, query.day_of_week() as f32),
            (&self.naming.flight_number, query.flight_number as f32),
        ];
        for (column, value) in numeric {
            if let Some(i) = self.schema.position(column) {
                values[i] = value;
            }
        }

        let mut categories = vec![
            (
                CategoryKind::Carrier,
                query.carrier.code().to_string(),
                self.naming.carrier_column(query.carrier),
            ),
            (
                CategoryKind::Origin,
                query.origin.clone(),
                self.naming.origin_column(&query.origin),
            ),
        ];
        if let Some(column) = self.naming.destination_column(&query.destination) {
            categories.push((CategoryKind::Destination, query.destination.clone(), column));
        }

        let mut unmatched = Vec::new();
        for (kind, value, column) in categories {
            match self.schema.position(&column) {
                Some(i) => values[i] = 1.0,
                None => {
                    if self.policy == CategoryPolicy::Strict {
                        return Err(FspError::UnmatchedCategory {
                            kind,
                            value,
                            column,
                        });
                    }
                    log::warn!(
                        "[Features] No schema column for {} '{}' (expected '{}'), indicators left at 0",
                        kind,
                        value,
                        column
                    );
                    unmatched.push(UnmatchedCategory {
                        kind,
                        value,
                        column,
                    });
                }
            }
        }

        log::debug!(
            "[Features] Encoded {}{} from {}: {} columns, {} unmatched",
            query.carrier,
            query.flight_number,
            query.origin,
            values.len(),
            unmatched.len()
        );

        Ok(EncodedFeatures { values, unmatched })
    }

    /// Categorical values the schema can represent.
    pub fn categories(&self) -> SchemaCategories {
        SchemaCategories::scan(&self.schema, &self.naming)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCategories {
    pub carriers: Vec<String>,
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
}

impl SchemaCategories {
    pub fn scan(schema: &FeatureSchema, naming: &ColumnNaming) -> Self {
        let pattern = |prefix: &str| Regex::new(&format!("^{}(.+)$", regex::escape(prefix)));

        let collect = |prefix: Option<&str>| -> Vec<String> {
            let re = match prefix.map(pattern) {
                Some(Ok(re)) => re,
                _ => return Vec::new(),
            };
            schema
                .columns()
                .iter()
                .filter_map(|c| re.captures(c).map(|cap| cap[1].to_string()))
                .collect()
        };

        Self {
            carriers: collect(Some(naming.carrier_prefix.as_str())),
            origins: collect(Some(naming.origin_prefix.as_str())),
            destinations: collect(naming.destination_prefix.as_deref()),
        }
    }
}
