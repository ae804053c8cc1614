pub mod config;
pub mod geocode;

use crate::{
    eta::{config::EtaConfig, geocode::Geocoder},
    route::{
        geo_point::GeoPoint,
        profile::{UserProfile, WalkingPace},
        stop::Stop,
    },
};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometres.
pub fn haversine_distance_km(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let dlat = (p2.lat - p1.lat).to_radians();
    let dlng = (p2.lng - p1.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let a = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Travel time estimation for a single user profile.
#[derive(Debug, Clone, Default)]
pub struct EtaEngine {
    config: EtaConfig,
}

impl EtaEngine {
    pub fn new(config: EtaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EtaConfig {
        &self.config
    }

    /// Minutes needed to cover `distance_meters` at the given pace. Public
    /// transport only applies to distances over the transit threshold.
    pub fn estimate_eta_minutes(
        &self,
        distance_meters: f64,
        pace: WalkingPace,
        uses_public_transport: bool,
    ) -> u32 {
        if !distance_meters.is_finite() || distance_meters <= 0.0 {
            return 0;
        }

        let mut speed = self.config.base_walking_speed_m_per_min * self.config.pace_factor(pace);
        if uses_public_transport && distance_meters > self.config.transit_threshold_m {
            speed *= self.config.transit_speedup;
        }
        if !speed.is_finite() || speed <= 0.0 {
            log::warn!("Walking speed {speed} is not usable, no estimate");
            return 0;
        }

        (distance_meters / speed).floor() as u32
    }

    /// Minutes from the user's current position to the first stop, if that
    /// stop has been located.
    pub fn time_to_first_stop(
        &self,
        user_position: GeoPoint,
        first_stop: &Stop,
        profile: &UserProfile,
    ) -> Option<u32> {
        let target = first_stop.geo_point?;
        if !user_position.is_finite() || !target.is_finite() {
            return None;
        }

        let distance_m = haversine_distance_km(user_position, target) * 1000.0;
        Some(self.estimate_eta_minutes(
            distance_m,
            profile.walking_pace,
            profile.uses_public_transport,
        ))
    }

    /// `None` when the speed can't produce an estimate.
    fn leg_minutes(&self, distance_km: f64, speed_km_per_min: f64) -> Option<u32> {
        if !speed_km_per_min.is_finite() || speed_km_per_min <= 0.0 {
            return None;
        }
        let travel = (distance_km / speed_km_per_min).round().max(0.0) as u32;
        Some(travel.saturating_add(self.config.dwell_buffer_minutes))
    }

    /// Geocode every stop with an address and re-derive the time needed to
    /// reach each stop from the one before it.
    ///
    /// Lookups happen one at a time in stop order. A failed lookup keeps the
    /// stop's previous point; a leg with an unlocated end keeps the stop's
    /// previous estimate. The first stop is always reset to zero. The input is
    /// left untouched.
    pub fn recalculate_stop_timings<G>(
        &self,
        stops: &[Stop],
        profile: &UserProfile,
        geocoder: &mut G,
    ) -> Vec<Stop>
    where
        G: Geocoder + ?Sized,
    {
        let speed = self
            .config
            .leg_speed_km_per_min(profile.walking_pace, profile.uses_public_transport);

        let mut updated = Vec::with_capacity(stops.len());
        let mut previous: Option<GeoPoint> = None;

        for (i, stop) in stops.iter().enumerate() {
            let mut stop = stop.clone();

            if stop.has_address() {
                match geocoder.geocode(&stop.address) {
                    Ok(Some(point)) if point.is_finite() => {
                        log::debug!("Geocoded stop {} to {:?}", stop.id, point);
                        stop.geo_point = Some(point);
                    }
                    Ok(Some(point)) => {
                        log::warn!("Ignoring non-finite point {:?} for stop {}", point, stop.id)
                    }
                    Ok(None) => log::debug!("No geocoding match for stop {}", stop.id),
                    Err(e) => log::warn!("Geocoding failed for stop {}: {:#}", stop.id, e),
                }
            }

            if i == 0 {
                stop.estimated_time_minutes = 0;
            } else if let (Some(prev), Some(curr)) = (previous, stop.geo_point) {
                if prev.is_finite() && curr.is_finite() {
                    let distance_km = haversine_distance_km(prev, curr);
                    match self.leg_minutes(distance_km, speed) {
                        Some(minutes) => stop.estimated_time_minutes = minutes,
                        None => log::warn!(
                            "Leg speed {speed} is not usable, keeping estimate for {}",
                            stop.id
                        ),
                    }
                }
            }

            previous = stop.geo_point;
            updated.push(stop);
        }

        updated
    }
}
