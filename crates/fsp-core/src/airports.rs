// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::query::normalize_iata;
use crate::route::LatLon;
use crate::FspError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub iata_code: String,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl AirportRecord {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

// OurAirports exports use the *_deg column names.
#[derive(Deserialize)]
struct CsvRow {
    #[serde(default)]
    iata_code: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(alias = "latitude_deg", default, deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
    #[serde(alias = "longitude_deg", default, deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
}

/// Read-only airport reference data keyed by IATA code.
#[derive(Debug, Clone, Default)]
pub struct AirportIndex {
    airports: Vec<AirportRecord>,
    by_code: HashMap<String, usize>,
}

impl AirportIndex {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FspError> {
        let file = File::open(path.as_ref())?;
        let index = Self::from_reader(file)?;
        log::info!(
            "[Airports] Loaded reference from {} ({} airports)",
            path.as_ref().display(),
            index.len()
        );
        Ok(index)
    }

    /// Rows without an IATA code or without usable coordinates are skipped.
    /// When a code appears more than once the first row wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FspError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in rdr.deserialize::<CsvRow>() {
            let row = row?;
            let code = match row.iata_code.as_deref().map(normalize_iata) {
                Some(c) if !c.is_empty() => c,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let (latitude, longitude) = match (row.latitude, row.longitude) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    log::debug!("[Airports] Skipping {} (no coordinates)", code);
                    skipped += 1;
                    continue;
                }
            };
            records.push(AirportRecord {
                iata_code: code,
                name: row.name.filter(|n| !n.is_empty()),
                latitude,
                longitude,
            });
        }

        if skipped > 0 {
            log::debug!("Skipped {} airport rows without IATA code or position", skipped);
        }
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<AirportRecord>) -> Self {
        let mut airports = Vec::with_capacity(records.len());
        let mut by_code = HashMap::with_capacity(records.len());
        for mut record in records {
            record.iata_code = normalize_iata(&record.iata_code);
            if by_code.contains_key(&record.iata_code) {
                continue;
            }
            by_code.insert(record.iata_code.clone(), airports.len());
            airports.push(record);
        }
        Self { airports, by_code }
    }

    /// Exact (case-insensitive) lookup by IATA code.
    pub fn get(&self, code: &str) -> Option<&AirportRecord> {
        self.by_code
            .get(&normalize_iata(code))
            .map(|&i| &self.airports[i])
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AirportRecord> {
        self.airports.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_ourairports_layout() {
        let data = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,iata_code
3622,KJFK,large_airport,John F Kennedy International Airport,40.639447,-73.779317,13,JFK
3484,KLAX,large_airport,Los Angeles International Airport,33.942501,-118.407997,125,LAX
6523,00A,heliport,Total RF Heliport,40.070985,-74.933689,11,
9999,XXXX,closed,Broken Row,,-10.0,0,BRK
";
        let index = AirportIndex::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(index.len(), 2);

        let jfk = index.get("jfk").unwrap();
        assert_eq!(jfk.iata_code, "JFK");
        assert_eq!(
            jfk.name.as_deref(),
            Some("John F Kennedy International Airport")
        );
        assert!((jfk.latitude - 40.639447).abs() < 1e-9);
        assert!((jfk.longitude - -73.779317).abs() < 1e-9);

        assert!(index.get("BRK").is_none());
        assert!(index.get("").is_none());
    }

    #[test]
    fn test_parse_plain_layout() {
        let data = "iata_code,latitude,longitude\nORD,41.9786,-87.9048\nord,0.0,0.0\n";
        let index = AirportIndex::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(index.len(), 1);
        // First row wins
        let ord = index.get("ORD").unwrap();
        assert!((ord.latitude - 41.9786).abs() < 1e-9);
        assert_eq!(ord.name, None);
    }
}
