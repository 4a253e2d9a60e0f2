// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::FspError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketing carriers the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carrier {
    #[serde(rename = "9E")]
    Endeavor,
    #[serde(rename = "AA")]
    American,
    #[serde(rename = "AS")]
    Alaska,
    #[serde(rename = "B6")]
    JetBlue,
    #[serde(rename = "DL")]
    Delta,
    #[serde(rename = "F9")]
    Frontier,
    #[serde(rename = "G4")]
    Allegiant,
    #[serde(rename = "HA")]
    Hawaiian,
    #[serde(rename = "MQ")]
    Envoy,
    #[serde(rename = "NK")]
    Spirit,
    #[serde(rename = "OH")]
    Psa,
    #[serde(rename = "OO")]
    SkyWest,
    #[serde(rename = "UA")]
    United,
    #[serde(rename = "WN")]
    Southwest,
    #[serde(rename = "YX")]
    Republic,
}

impl Carrier {
    pub const ALL: [Carrier; 15] = [
        Carrier::Endeavor,
        Carrier::American,
        Carrier::Alaska,
        Carrier::JetBlue,
        Carrier::Delta,
        Carrier::Frontier,
        Carrier::Allegiant,
        Carrier::Hawaiian,
        Carrier::Envoy,
        Carrier::Spirit,
        Carrier::Psa,
        Carrier::SkyWest,
        Carrier::United,
        Carrier::Southwest,
        Carrier::Republic,
    ];

    /// Two-character IATA designator.
    pub fn code(self) -> &'static str {
        match self {
            Carrier::Endeavor => "9E",
            Carrier::American => "AA",
            Carrier::Alaska => "AS",
            Carrier::JetBlue => "B6",
            Carrier::Delta => "DL",
            Carrier::Frontier => "F9",
            Carrier::Allegiant => "G4",
            Carrier::Hawaiian => "HA",
            Carrier::Envoy => "MQ",
            Carrier::Spirit => "NK",
            Carrier::Psa => "OH",
            Carrier::SkyWest => "OO",
            Carrier::United => "UA",
            Carrier::Southwest => "WN",
            Carrier::Republic => "YX",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Carrier {
    type Err = FspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Carrier::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| FspError::UnknownCarrier(code.to_string()))
    }
}

/// One user request. Lives for a single prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightQuery {
    pub carrier: Carrier,
    pub flight_number: u32,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

impl FlightQuery {
    pub fn new(
        carrier: Carrier,
        flight_number: u32,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Self {
        Self {
            carrier,
            flight_number,
            origin: normalize_iata(origin),
            destination: normalize_iata(destination),
            date,
        }
    }

    /// Builds a query from free-text form fields, applying the same
    /// coercions as the interactive form.
    pub fn from_form(
        carrier: &str,
        flight_number: &str,
        origin: &str,
        destination: &str,
        date: &str,
    ) -> Result<Self, FspError> {
        let carrier = carrier.parse()?;
        let date = parse_date(date)?;
        Ok(Self::new(
            carrier,
            coerce_flight_number(flight_number),
            origin,
            destination,
            date,
        ))
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day_of_month(&self) -> u32 {
        self.date.day()
    }

    /// Monday = 1 .. Sunday = 7.
    pub fn day_of_week(&self) -> u32 {
        self.date.weekday().number_from_monday()
    }
}

pub fn normalize_iata(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, FspError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| FspError::InvalidDate(s.trim().to_string()))
}

/// Anything other than a plain run of ASCII digits becomes 0.
pub fn coerce_flight_number(raw: &str) -> u32 {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        if !raw.is_empty() {
            log::debug!("[Query] Non-numeric flight number {:?} treated as 0", raw);
        }
        return 0;
    }
    match raw.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            log::warn!("[Query] Flight number {} out of range, treated as 0", raw);
            0
        }
    }
}
