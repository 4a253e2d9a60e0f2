// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! deck.gl JSON for the route map: a neon arc, a plane marker at the
//! midpoint and a tilted camera over it.

use crate::route::{MapConfig, RouteGeometry, RouteMarker, ViewState};
use serde::Serialize;

pub const ARC_SOURCE_COLOR: [u8; 4] = [0, 255, 128, 200];
pub const ARC_TARGET_COLOR: [u8; 4] = [255, 100, 0, 200];
pub const ARC_WIDTH: u32 = 6;
pub const MARKER_SIZE: u32 = 35;
pub const MARKER_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub layers: Vec<Layer>,
    pub initial_view_state: DeckViewState,
    pub map_style: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Layer {
    Arc(ArcLayer),
    Text(TextLayer),
}

#[derive(Debug, Clone, Serialize)]
pub struct ArcDatum {
    pub source: [f64; 2],
    pub target: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcLayer {
    #[serde(rename = "@@type")]
    pub layer_type: &'static str,
    pub id: String,
    pub data: Vec<ArcDatum>,
    pub get_source_position: &'static str,
    pub get_target_position: &'static str,
    pub get_source_color: [u8; 4],
    pub get_target_color: [u8; 4],
    pub get_width: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    #[serde(rename = "@@type")]
    pub layer_type: &'static str,
    pub id: String,
    pub data: Vec<RouteMarker>,
    pub get_position: &'static str,
    pub get_text: &'static str,
    pub get_size: u32,
    pub get_color: [u8; 3],
    pub get_angle: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl From<&ViewState> for DeckViewState {
    fn from(v: &ViewState) -> Self {
        Self {
            latitude: v.latitude,
            longitude: v.longitude,
            zoom: v.zoom,
            pitch: v.pitch,
            bearing: v.bearing,
        }
    }
}

impl Deck {
    pub fn for_route(route: &RouteGeometry, map: &MapConfig) -> Self {
        let arc = ArcLayer {
            layer_type: "ArcLayer",
            id: "route-arc".to_string(),
            data: vec![ArcDatum {
                source: route.arc.source,
                target: route.arc.target,
            }],
            get_source_position: "@@=source",
            get_target_position: "@@=target",
            get_source_color: ARC_SOURCE_COLOR,
            get_target_color: ARC_TARGET_COLOR,
            get_width: ARC_WIDTH,
        };

        let plane = TextLayer {
            layer_type: "TextLayer",
            id: "route-plane".to_string(),
            data: vec![route.marker.clone()],
            get_position: "@@=coord",
            get_text: "@@=icon",
            get_size: MARKER_SIZE,
            get_color: MARKER_COLOR,
            get_angle: 0.0,
        };

        Self {
            layers: vec![Layer::Arc(arc), Layer::Text(plane)],
            initial_view_state: DeckViewState::from(&route.view),
            map_style: map.map_style.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
