use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::route::profile::WalkingPace;

/// Constants of the travel time model.
///
/// Two speed models coexist: a metres-per-minute model for the distance from
/// the user's own position to the first stop, and a km-per-minute model for
/// the legs between stops, which also adds a dwell buffer for the time spent
/// at the previous stop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EtaConfig {
    pub base_walking_speed_m_per_min: f64,
    pub slow_pace_factor: f64,
    pub moderate_pace_factor: f64,
    pub fast_pace_factor: f64,
    pub transit_speedup: f64,
    /// Transit only kicks in for distances strictly above this.
    pub transit_threshold_m: f64,
    pub slow_leg_speed_km_per_min: f64,
    pub moderate_leg_speed_km_per_min: f64,
    pub fast_leg_speed_km_per_min: f64,
    pub leg_transit_multiplier: f64,
    pub dwell_buffer_minutes: u32,
    pub road_transit_divisor: f64,
    pub min_road_leg_minutes: u32,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            base_walking_speed_m_per_min: 83.0,
            slow_pace_factor: 0.8,
            moderate_pace_factor: 1.0,
            fast_pace_factor: 1.2,
            transit_speedup: 3.0,
            transit_threshold_m: 1000.0,
            slow_leg_speed_km_per_min: 0.05,
            moderate_leg_speed_km_per_min: 0.08,
            fast_leg_speed_km_per_min: 0.11,
            leg_transit_multiplier: 3.0,
            dwell_buffer_minutes: 15,
            road_transit_divisor: 2.5,
            min_road_leg_minutes: 1,
        }
    }
}

impl EtaConfig {
    /// Parse a (possibly partial) JSON override. Missing keys keep their
    /// default value.
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(s).context("Failed to parse ETA config")?;
        config.validate()?;
        Ok(config)
    }

    /// Every speed, factor and divisor has to be a positive finite number, and
    /// the transit threshold a non-negative one.
    pub fn validate(&self) -> anyhow::Result<()> {
        let positive = [
            ("base_walking_speed_m_per_min", self.base_walking_speed_m_per_min),
            ("slow_pace_factor", self.slow_pace_factor),
            ("moderate_pace_factor", self.moderate_pace_factor),
            ("fast_pace_factor", self.fast_pace_factor),
            ("transit_speedup", self.transit_speedup),
            ("slow_leg_speed_km_per_min", self.slow_leg_speed_km_per_min),
            ("moderate_leg_speed_km_per_min", self.moderate_leg_speed_km_per_min),
            ("fast_leg_speed_km_per_min", self.fast_leg_speed_km_per_min),
            ("leg_transit_multiplier", self.leg_transit_multiplier),
            ("road_transit_divisor", self.road_transit_divisor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(anyhow!("{name} must be a positive number, got {value}"));
            }
        }

        if !self.transit_threshold_m.is_finite() || self.transit_threshold_m < 0.0 {
            return Err(anyhow!(
                "transit_threshold_m must be a non-negative number, got {}",
                self.transit_threshold_m
            ));
        }

        Ok(())
    }

    pub fn pace_factor(&self, pace: WalkingPace) -> f64 {
        match pace {
            WalkingPace::Slow => self.slow_pace_factor,
            WalkingPace::Moderate => self.moderate_pace_factor,
            WalkingPace::Fast => self.fast_pace_factor,
        }
    }

    pub fn leg_speed_km_per_min(&self, pace: WalkingPace, uses_public_transport: bool) -> f64 {
        let speed = match pace {
            WalkingPace::Slow => self.slow_leg_speed_km_per_min,
            WalkingPace::Moderate => self.moderate_leg_speed_km_per_min,
            WalkingPace::Fast => self.fast_leg_speed_km_per_min,
        };

        if uses_public_transport {
            speed * self.leg_transit_multiplier
        } else {
            speed
        }
    }
}
