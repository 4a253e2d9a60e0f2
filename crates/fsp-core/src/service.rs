// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! One prediction request end to end: encode, classify, draw the route.
//!
//! The service holds no global state. Airports, schema and classifier are
//! loaded by the caller (or by [`FlightStatusService::from_config`]) and
//! shared read-only, so a single instance can serve parallel requests.

use crate::airports::AirportIndex;
use crate::config::{AppConfig, NamingSetting};
use crate::features::{
    CategoryPolicy, ColumnNaming, FeatureEncoder, FeatureSchema, UnmatchedCategory,
};
use crate::query::FlightQuery;
use crate::route::{route_between, MapConfig, RouteGeometry};
use crate::FspError;
use fsp_model::{Classifier, Prediction, RandomClassifier, XgbModel};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

pub const AIRPORT_NOT_FOUND_WARNING: &str =
    "Could not find coordinates for the entered IATA codes.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub headline: String,
    pub detail: String,
}

impl StatusMessage {
    pub fn for_prediction(prediction: Prediction) -> Self {
        match prediction {
            Prediction::OnTime => Self {
                headline: "✅ Status: ON TIME".to_string(),
                detail: "Your flight is predicted to be on schedule. Have a nice trip!"
                    .to_string(),
            },
            Prediction::Delayed => Self {
                headline: "⚠️ Status: DELAYED".to_string(),
                detail: "There is a high probability of delay for this flight.".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub query: FlightQuery,
    pub prediction: Prediction,
    pub delay_probability: f32,
    pub classifier: String,
    pub status: StatusMessage,
    pub route: Option<RouteGeometry>,
    pub warning: Option<String>,
    pub unmatched: Vec<UnmatchedCategory>,
}

pub struct FlightStatusService {
    airports: Arc<AirportIndex>,
    encoder: FeatureEncoder,
    classifier: Arc<dyn Classifier>,
    map: MapConfig,
}

impl FlightStatusService {
    /// Fails when the classifier records its training columns and they differ
    /// from the encoder's schema.
    pub fn new(
        airports: Arc<AirportIndex>,
        encoder: FeatureEncoder,
        classifier: Arc<dyn Classifier>,
        map: MapConfig,
    ) -> Result<Self, FspError> {
        if let Some(names) = classifier.feature_names() {
            check_schema(encoder.schema(), names)?;
        }
        let missing = encoder.missing_numeric_columns();
        if !missing.is_empty() {
            if encoder.policy() == CategoryPolicy::Strict {
                return Err(FspError::SchemaMismatch(format!(
                    "no column for {}",
                    missing.join(", ")
                )));
            }
            log::warn!(
                "[Service] Schema has no column for {}; those fields are not sent to the model",
                missing.join(", ")
            );
        }
        log::info!(
            "[Service] Ready with classifier {} ({} columns, {} airports)",
            classifier.name(),
            encoder.schema().len(),
            airports.len()
        );
        Ok(Self {
            airports,
            encoder,
            classifier,
            map,
        })
    }

    /// Loads everything the config points at.
    ///
    /// Schema precedence: `schema_path`, then `columns`, then the model's own
    /// feature names, then the numeric columns of the configured naming.
    pub fn from_config(config: &AppConfig) -> Result<Self, FspError> {
        let airports = Arc::new(AirportIndex::load(&config.airports_path)?);

        let classifier: Arc<dyn Classifier> = match &config.model_path {
            Some(path) => Arc::new(XgbModel::load(path)?),
            None => {
                log::warn!("No model configured; using the random placeholder classifier");
                match config.placeholder_seed {
                    Some(seed) => Arc::new(RandomClassifier::seeded(seed)),
                    None => Arc::new(RandomClassifier::new()),
                }
            }
        };

        let mut naming = config.naming.resolve();
        let schema = if let Some(path) = &config.schema_path {
            FeatureSchema::load(path)?
        } else if let Some(columns) = &config.columns {
            FeatureSchema::new(columns.iter().cloned())?
        } else if let Some(names) = classifier.feature_names() {
            let schema = FeatureSchema::new(names.iter().cloned())?;
            // A preset is only a guess; follow the names the model was trained on.
            if let NamingSetting::Preset(_) = config.naming {
                if let Some(detected) = ColumnNaming::detect(&schema) {
                    if detected != naming {
                        log::info!(
                            "[Service] Column naming switched to match the model's feature names"
                        );
                        naming = detected;
                    }
                }
            }
            schema
        } else {
            FeatureSchema::new(naming.numeric_columns())?
        };

        let encoder = FeatureEncoder::new(schema, naming, config.category_policy);
        Self::new(airports, encoder, classifier, config.map.clone())
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn airports(&self) -> &AirportIndex {
        &self.airports
    }

    pub fn map(&self) -> &MapConfig {
        &self.map
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn route(&self, origin: &str, destination: &str) -> Result<RouteGeometry, FspError> {
        route_between(&self.airports, origin, destination, &self.map)
    }

    /// An unknown airport is not an error: the report carries a warning and
    /// no route.
    pub fn predict(&self, query: &FlightQuery) -> Result<FlightReport, FspError> {
        let encoded = self.encoder.encode(query)?;
        let delay_probability = self.classifier.predict_proba(&encoded.values)?;
        let prediction = Prediction::from_probability(delay_probability);

        let (route, warning) = match self.route(&query.origin, &query.destination) {
            Ok(route) => (Some(route), None),
            Err(FspError::AirportsNotFound(codes)) => {
                log::warn!("[Service] Could not find airports: {}", codes.join(","));
                (None, Some(AIRPORT_NOT_FOUND_WARNING.to_string()))
            }
            Err(e) => return Err(e),
        };

        log::debug!(
            "[Service] {}{} {} -> {} on {}: {} (p={:.3})",
            query.carrier,
            query.flight_number,
            query.origin,
            query.destination,
            query.date,
            prediction,
            delay_probability
        );

        Ok(FlightReport {
            query: query.clone(),
            prediction,
            delay_probability,
            classifier: self.classifier.name().to_string(),
            status: StatusMessage::for_prediction(prediction),
            route,
            warning,
            unmatched: encoded.unmatched,
        })
    }

    /// Independent predictions, evaluated in parallel; results keep input order.
    pub fn predict_many(&self, queries: &[FlightQuery]) -> Vec<Result<FlightReport, FspError>> {
        queries.par_iter().map(|q| self.predict(q)).collect()
    }
}

fn check_schema(schema: &FeatureSchema, model_columns: &[String]) -> Result<(), FspError> {
    if schema.columns() == model_columns {
        return Ok(());
    }
    if schema.len() != model_columns.len() {
        return Err(FspError::SchemaMismatch(format!(
            "schema has {} columns, model was trained on {}",
            schema.len(),
            model_columns.len()
        )));
    }
    let (i, (ours, theirs)) = schema
        .columns()
        .iter()
        .zip(model_columns)
        .enumerate()
        .find(|(_, (a, b))| a != b)
        .ok_or_else(|| FspError::SchemaMismatch("column order differs".to_string()))?;
    Err(FspError::SchemaMismatch(format!(
        "column {} is '{}' but the model expects '{}'",
        i, ours, theirs
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airports::AirportRecord;
    use crate::query::Carrier;
    use chrono::NaiveDate;
    use fsp_model::ModelError;

    /// Always answers with the same probability.
    struct Fixed(f32, Option<Vec<String>>);

    impl Classifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict_proba(&self, _features: &[f32]) -> Result<f32, ModelError> {
            Ok(self.0)
        }

        fn feature_names(&self) -> Option<&[String]> {
            self.1.as_deref()
        }
    }

    fn airports() -> Arc<AirportIndex> {
        Arc::new(AirportIndex::from_records(vec![
            AirportRecord {
                iata_code: "ATL".to_string(),
                name: Some("Hartsfield-Jackson Atlanta International Airport".to_string()),
                latitude: 33.6367,
                longitude: -84.4281,
            },
            AirportRecord {
                iata_code: "ORD".to_string(),
                name: None,
                latitude: 41.9786,
                longitude: -87.9048,
            },
        ]))
    }

    fn encoder() -> FeatureEncoder {
        FeatureEncoder::new(
            FeatureSchema::new(["year", "month", "day", "carrier_indicator_DL"]).unwrap(),
            ColumnNaming::generic(),
            CategoryPolicy::Lenient,
        )
    }

    fn service(p: f32) -> FlightStatusService {
        FlightStatusService::new(
            airports(),
            encoder(),
            Arc::new(Fixed(p, None)),
            MapConfig::default(),
        )
        .unwrap()
    }

    fn query(origin: &str, destination: &str) -> FlightQuery {
        FlightQuery::new(
            Carrier::Delta,
            2211,
            origin,
            destination,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    #[test]
    fn test_on_time_report_with_route() {
        let report = service(0.2).predict(&query("ATL", "ORD")).unwrap();
        assert_eq!(report.prediction, Prediction::OnTime);
        assert!(report.status.headline.contains("ON TIME"));
        assert!(report.warning.is_none());
        let route = report.route.unwrap();
        assert!((route.view.latitude - (33.6367 + 41.9786) / 2.0).abs() < 1e-12);
        // origin ATL has no indicator column in this schema
        assert_eq!(report.unmatched.len(), 1);
    }

    #[test]
    fn test_delayed_report_without_route() {
        let report = service(0.9).predict(&query("ATL", "ZZZ")).unwrap();
        assert_eq!(report.prediction, Prediction::Delayed);
        assert!(report.status.headline.contains("DELAYED"));
        assert!(report.route.is_none());
        assert_eq!(report.warning.as_deref(), Some(AIRPORT_NOT_FOUND_WARNING));
    }

    #[test]
    fn test_schema_must_match_model_columns() {
        let model_columns = vec![
            "year".to_string(),
            "month".to_string(),
            "day_of_month".to_string(),
            "carrier_indicator_DL".to_string(),
        ];
        let result = FlightStatusService::new(
            airports(),
            encoder(),
            Arc::new(Fixed(0.5, Some(model_columns))),
            MapConfig::default(),
        );
        match result {
            Err(FspError::SchemaMismatch(msg)) => assert!(msg.contains("day_of_month")),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("mismatched schema accepted"),
        }
    }

    #[test]
    fn test_predict_many_keeps_order() {
        let svc = service(0.7);
        let queries = vec![query("ATL", "ORD"), query("XXX", "ORD"), query("ORD", "ATL")];
        let reports = svc.predict_many(&queries);
        assert_eq!(reports.len(), 3);
        let origins: Vec<_> = reports
            .iter()
            .map(|r| r.as_ref().unwrap().query.origin.clone())
            .collect();
        assert_eq!(origins, vec!["ATL", "XXX", "ORD"]);
        assert!(reports[1].as_ref().unwrap().route.is_none());
    }

    #[test]
    fn test_missing_numeric_columns_rejected_when_strict() {
        let strict = FeatureEncoder::new(
            encoder().schema().clone(),
            ColumnNaming::generic(),
            CategoryPolicy::Strict,
        );
        let result = FlightStatusService::new(
            airports(),
            strict,
            Arc::new(Fixed(0.5, None)),
            MapConfig::default(),
        );
        match result {
            Err(FspError::SchemaMismatch(msg)) => {
                assert!(msg.contains("day_of_week"));
                assert!(msg.contains("flight_number"));
                assert!(!msg.contains("month"));
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("schema without numeric columns accepted"),
        }

        // Lenient keeps going
        assert_eq!(
            service(0.5).encoder().missing_numeric_columns(),
            vec!["day_of_week", "flight_number"]
        );
    }
}
