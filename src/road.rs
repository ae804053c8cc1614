use std::collections::BTreeMap;

use anyhow::Context;

use crate::{
    eta::EtaEngine,
    route::{geo_point::GeoPoint, profile::UserProfile, stop::Stop},
};

/// Result of an external walking router: the drawn line and the duration of
/// each leg between consecutive waypoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Road {
    pub polyline: Vec<GeoPoint>,
    pub leg_durations_secs: Vec<f64>,
}

pub trait RoadRouter {
    fn route(&mut self, waypoints: &[GeoPoint]) -> anyhow::Result<Road>;
}

/// A routed road together with per-stop minutes derived from its legs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadPlan {
    pub polyline: Vec<GeoPoint>,
    /// Keyed by the index of the stop a leg arrives at.
    pub leg_minutes: BTreeMap<usize, u32>,
}

impl EtaEngine {
    /// Convert router leg durations into display minutes. Leg `i` arrives at
    /// waypoint `i + 1`.
    pub fn road_leg_minutes(&self, road: &Road, uses_public_transport: bool) -> BTreeMap<usize, u32> {
        let config = self.config();
        road.leg_durations_secs
            .iter()
            .enumerate()
            .map(|(i, secs)| {
                let raw = (secs.max(0.0) / 60.0).trunc();
                let adjusted = if uses_public_transport {
                    (raw / config.road_transit_divisor).trunc()
                } else {
                    raw
                };
                (i + 1, (adjusted as u32).max(config.min_road_leg_minutes))
            })
            .collect()
    }

    /// Ask `router` for a walking road through every located stop.
    ///
    /// Returns `None` when no stop has a point. Unlocated stops are skipped as
    /// waypoints, and each routed leg is keyed by the index of the located stop
    /// it arrives at.
    pub fn plan_road<R>(
        &self,
        stops: &[Stop],
        profile: &UserProfile,
        router: &mut R,
    ) -> anyhow::Result<Option<RoadPlan>>
    where
        R: RoadRouter + ?Sized,
    {
        let (stop_indices, waypoints): (Vec<usize>, Vec<GeoPoint>) = stops
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.geo_point.map(|p| (i, p)))
            .unzip();
        if waypoints.is_empty() {
            return Ok(None);
        }

        let road = router
            .route(&waypoints)
            .context("Failed to route between stops")?;
        log::debug!(
            "Routed {} waypoints into {} legs",
            waypoints.len(),
            road.leg_durations_secs.len()
        );

        // waypoint n is stop_indices[n]
        let leg_minutes = self
            .road_leg_minutes(&road, profile.uses_public_transport)
            .into_iter()
            .filter_map(|(waypoint, minutes)| Some((*stop_indices.get(waypoint)?, minutes)))
            .collect();

        Ok(Some(RoadPlan {
            leg_minutes,
            polyline: road.polyline,
        }))
    }
}
