// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Route geometry for the arc map.
//!
//! Positions handed to the renderer are `[lon, lat]` pairs, matching the
//! deck.gl convention. The plane marker and the camera sit on the *linear*
//! midpoint of the two airports, not the geodesic one. The great-circle
//! figures are informational only.

use crate::airports::AirportIndex;
use crate::query::normalize_iata;
use crate::FspError;
use serde::{Deserialize, Serialize};

pub const PLANE_ICON: &str = "✈️";
pub const DARK_MAP_STYLE: &str = "mapbox://styles/mapbox/dark-v10";

const EARTH_RADIUS_NM: f64 = 3440.06;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `[lon, lat]`, the order map layers consume.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub map_style: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: 3.5,
            // Tilted so the arc reads as 3D
            pitch: 50.0,
            bearing: 0.0,
            map_style: DARK_MAP_STYLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    pub source: [f64; 2],
    pub target: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMarker {
    pub coord: [f64; 2],
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub arc: ArcSegment,
    pub marker: RouteMarker,
    pub view: ViewState,
    pub distance_nm: f64,
    pub initial_course_deg: f64,
}

impl RouteGeometry {
    pub fn midpoint(&self) -> LatLon {
        LatLon::new(self.marker.coord[1], self.marker.coord[0])
    }
}

pub fn build_route(origin: LatLon, destination: LatLon, map: &MapConfig) -> RouteGeometry {
    let mid = LatLon::new(
        (origin.lat + destination.lat) / 2.0,
        (origin.lon + destination.lon) / 2.0,
    );

    RouteGeometry {
        arc: ArcSegment {
            source: origin.lon_lat(),
            target: destination.lon_lat(),
        },
        marker: RouteMarker {
            coord: mid.lon_lat(),
            icon: PLANE_ICON.to_string(),
        },
        view: ViewState {
            latitude: mid.lat,
            longitude: mid.lon,
            zoom: map.zoom,
            pitch: map.pitch,
            bearing: map.bearing,
        },
        distance_nm: haversine_nm(origin, destination),
        initial_course_deg: initial_course_deg(origin, destination),
    }
}

/// Looks both codes up and builds the route. Every code without a record is
/// reported, and no geometry is produced unless both resolve.
pub fn route_between(
    airports: &AirportIndex,
    origin: &str,
    destination: &str,
    map: &MapConfig,
) -> Result<RouteGeometry, FspError> {
    let from = airports.get(origin);
    let to = airports.get(destination);

    match (from, to) {
        (Some(a), Some(b)) => Ok(build_route(a.position(), b.position(), map)),
        _ => {
            let mut missing = Vec::new();
            if from.is_none() {
                missing.push(normalize_iata(origin));
            }
            if to.is_none() {
                missing.push(normalize_iata(destination));
            }
            Err(FspError::AirportsNotFound(missing))
        }
    }
}

pub fn haversine_nm(a: LatLon, b: LatLon) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_NM * c
}

/// True course at departure, 0..360.
pub fn initial_course_deg(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lon = (b.lon - a.lon).to_radians();
    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airports::AirportRecord;

    fn airports() -> AirportIndex {
        AirportIndex::from_records(vec![
            AirportRecord {
                iata_code: "JFK".to_string(),
                name: None,
                latitude: 40.6413,
                longitude: -73.7781,
            },
            AirportRecord {
                iata_code: "LAX".to_string(),
                name: None,
                latitude: 33.9416,
                longitude: -118.4085,
            },
        ])
    }

    #[test]
    fn test_midpoint_is_linear_mean() {
        let route = route_between(&airports(), "JFK", "LAX", &MapConfig::default()).unwrap();
        let mid = route.midpoint();
        assert!((mid.lat - (40.6413 + 33.9416) / 2.0).abs() < 1e-12);
        assert!((mid.lon - (-73.7781 + -118.4085) / 2.0).abs() < 1e-12);
        assert_eq!(route.view.latitude, mid.lat);
        assert_eq!(route.view.longitude, mid.lon);
    }

    #[test]
    fn test_arc_endpoints_are_lon_lat() {
        let route = route_between(&airports(), "jfk", "lax", &MapConfig::default()).unwrap();
        assert_eq!(route.arc.source, [-73.7781, 40.6413]);
        assert_eq!(route.arc.target, [-118.4085, 33.9416]);
        assert_eq!(route.marker.icon, PLANE_ICON);
    }

    #[test]
    fn test_fixed_camera() {
        let route = route_between(&airports(), "JFK", "LAX", &MapConfig::default()).unwrap();
        assert_eq!(route.view.zoom, 3.5);
        assert_eq!(route.view.pitch, 50.0);
        assert_eq!(route.view.bearing, 0.0);
    }

    #[test]
    fn test_missing_codes_reported() {
        let err = route_between(&airports(), "JFK", "XXX", &MapConfig::default()).unwrap_err();
        match err {
            FspError::AirportsNotFound(codes) => assert_eq!(codes, vec!["XXX".to_string()]),
            other => panic!("unexpected error: {}", other),
        }

        let err = route_between(&airports(), "aaa", "bbb", &MapConfig::default()).unwrap_err();
        match err {
            FspError::AirportsNotFound(codes) => assert_eq!(codes, vec!["AAA", "BBB"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_great_circle_figures() {
        let jfk = LatLon::new(40.6413, -73.7781);
        let lax = LatLon::new(33.9416, -118.4085);
        let d = haversine_nm(jfk, lax);
        // Published great-circle distance is about 2150 nm
        assert!((d - 2150.0).abs() < 10.0, "distance was {}", d);

        let course = initial_course_deg(jfk, lax);
        assert!(course > 270.0 && course < 280.0, "course was {}", course);

        let north = initial_course_deg(LatLon::new(0.0, 0.0), LatLon::new(10.0, 0.0));
        assert!(north.abs() < 1e-9);
        let east = initial_course_deg(LatLon::new(0.0, 0.0), LatLon::new(0.0, 10.0));
        assert!((east - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let half = std::f64::consts::PI * EARTH_RADIUS_NM;
        let pairs = [
            (LatLon::new(0.0, 0.0), LatLon::new(0.0, 180.0)),
            (LatLon::new(45.0, 0.0), LatLon::new(-45.0, 180.0)),
            (LatLon::new(33.9416, -118.4085), LatLon::new(-33.9416, 61.5915)),
        ];
        for (a, b) in pairs {
            let d = haversine_nm(a, b);
            assert!(d.is_finite(), "{:?} -> {:?} gave {}", a, b, d);
            assert!((d - half).abs() < 1e-3, "{:?} -> {:?} gave {}", a, b, d);
        }
    }
}
