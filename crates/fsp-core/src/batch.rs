// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::query::FlightQuery;
use crate::service::FlightStatusService;
use crate::FspError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// One input row, taken as raw text so the form coercions apply.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    pub carrier: String,
    #[serde(default)]
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub row: usize,
    pub carrier: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub date: String,
    pub prediction: Option<u8>,
    pub status: String,
    pub delay_probability: Option<f32>,
    pub distance_nm: Option<f64>,
    pub warning: String,
    pub error: String,
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<BatchRow>, FspError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Rows that fail to parse or predict are kept, with the error text filled in.
pub fn run(service: &FlightStatusService, rows: &[BatchRow]) -> Vec<BatchResult> {
    rows.par_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut result = BatchResult {
                row: i + 1,
                carrier: row.carrier.clone(),
                flight_number: row.flight_number.clone(),
                origin: row.origin.clone(),
                destination: row.destination.clone(),
                date: row.date.clone(),
                prediction: None,
                status: String::new(),
                delay_probability: None,
                distance_nm: None,
                warning: String::new(),
                error: String::new(),
            };

            let outcome = FlightQuery::from_form(
                &row.carrier,
                &row.flight_number,
                &row.origin,
                &row.destination,
                &row.date,
            )
            .and_then(|q| service.predict(&q));

            match outcome {
                Ok(report) => {
                    result.prediction = Some(report.prediction.label());
                    result.status = report.prediction.to_string();
                    result.delay_probability = Some(report.delay_probability);
                    result.distance_nm = report.route.map(|r| r.distance_nm.round());
                    result.warning = report.warning.unwrap_or_default();
                }
                Err(e) => {
                    log::warn!("[Batch] Row {} failed: {}", i + 1, e);
                    result.error = e.to_string();
                }
            }
            result
        })
        .collect()
}

pub fn write_results<W: Write>(writer: W, results: &[BatchResult]) -> Result<(), FspError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}
