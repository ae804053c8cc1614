pub mod geo_point;
pub mod profile;
pub mod stop;

use anyhow::Context;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{eta::haversine_distance_km, route::stop::Stop};

/// An authored, ordered sequence of stops. Stop order is the walking order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub theme: String,
    pub description: String,
    pub total_time_minutes: u32,
    pub distance: String,
    pub stops: Vec<Stop>,
    pub image_url: Option<String>,
    pub author_id: String,
    pub icon_id: String,
    pub popularity_score: i64,
}

impl Route {
    pub fn new(name: String, stops: Vec<Stop>) -> Self {
        let mut route = Self {
            name,
            stops,
            icon_id: "place".to_owned(),
            ..Default::default()
        };
        route.refresh_totals();
        route
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("Failed to parse route document")
    }

    pub fn sum_stop_minutes(&self) -> u32 {
        self.stops
            .iter()
            .map(|s| s.estimated_time_minutes)
            .fold(0, u32::saturating_add)
    }

    /// Summed great-circle length of every leg whose two ends are located.
    pub fn distance_km(&self) -> f64 {
        self.stops
            .iter()
            .tuple_windows()
            .filter_map(|(a, b)| match (a.geo_point, b.geo_point) {
                (Some(p1), Some(p2)) => Some(haversine_distance_km(p1, p2)),
                _ => None,
            })
            .fold(0.0, |acc, d| acc + d)
    }

    /// Recompute the derived `total_time_minutes` and `distance` label from
    /// the stops. Call after any change to the stop list.
    pub fn refresh_totals(&mut self) {
        self.total_time_minutes = self.sum_stop_minutes();
        self.distance = format!("{:.1} km", self.distance_km());
    }
}
