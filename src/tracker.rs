use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Context;
use chrono::{NaiveDateTime, TimeDelta};
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::{
    road::RoadPlan,
    route::{
        geo_point::GeoPoint,
        stop::{Stop, StopId},
        Route,
    },
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Stop index {index} is out of range for a route with {stop_count} stops")]
    InvalidIndex { index: usize, stop_count: usize },
}

/// Progress of one walk through a route. Plain data so a host can snapshot
/// and restore it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerState {
    pub current_stop_index: usize,
    pub completed_stop_ids: HashSet<StopId>,
    pub user_notes: HashMap<StopId, String>,
    pub editing_note_id: Option<StopId>,
}

#[derive(Serialize)]
struct StopFeature {
    id: StopId,
    name: String,
    index: usize,
    estimated_time_minutes: u32,
    completed: bool,
    current: bool,
    #[serde(serialize_with = "geojson::ser::serialize_geometry")]
    geometry: Point,
}

/// Walks a fixed list of stops: which one is current, which are done, and
/// the walker's own notes.
///
/// Not synchronised. Callers on more than one thread have to serialise access
/// themselves.
#[derive(Debug, Clone)]
pub struct RouteProgressTracker {
    stops: Vec<Stop>,
    state: TrackerState,
    road: Option<RoadPlan>,
}

impl RouteProgressTracker {
    pub fn new(stops: Vec<Stop>) -> Self {
        Self {
            stops,
            state: TrackerState::default(),
            road: None,
        }
    }

    pub fn from_route(route: &Route) -> Self {
        Self::new(route.stops.clone())
    }

    /// Rebuild a tracker from a saved state. The saved index must point at one
    /// of `stops`, or be zero for an empty route.
    pub fn restore(stops: Vec<Stop>, state: TrackerState) -> Result<Self, TrackerError> {
        let in_range = state.current_stop_index < stops.len()
            || (stops.is_empty() && state.current_stop_index == 0);
        if !in_range {
            return Err(TrackerError::InvalidIndex {
                index: state.current_stop_index,
                stop_count: stops.len(),
            });
        }

        Ok(Self {
            stops,
            state,
            road: None,
        })
    }

    pub fn snapshot(&self) -> TrackerState {
        self.state.clone()
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn current_stop_index(&self) -> usize {
        self.state.current_stop_index
    }

    pub fn current_stop(&self) -> Option<&Stop> {
        self.stops.get(self.state.current_stop_index)
    }

    fn last_index(&self) -> Option<usize> {
        self.stops.len().checked_sub(1)
    }

    /// Mark the current stop done and move on to the next one, unless this is
    /// the last stop.
    pub fn complete_current_stop(&mut self) {
        let Some(stop) = self.stops.get(self.state.current_stop_index) else {
            return;
        };

        log::debug!("Completed stop {}", stop.id);
        self.state.completed_stop_ids.insert(stop.id.clone());
        self.advance();
    }

    pub fn advance(&mut self) {
        if let Some(last) = self.last_index() {
            if self.state.current_stop_index < last {
                self.state.current_stop_index += 1;
            }
        }
    }

    pub fn retreat(&mut self) {
        if self.state.current_stop_index > 0 {
            self.state.current_stop_index -= 1;
        }
    }

    /// Move to `index`. Out of range requests are ignored; see `try_jump_to`
    /// for a variant that reports them.
    pub fn jump_to(&mut self, index: usize) {
        if let Err(e) = self.try_jump_to(index) {
            log::debug!("Ignoring jump: {e}");
        }
    }

    pub fn try_jump_to(&mut self, index: usize) -> Result<(), TrackerError> {
        if index >= self.stops.len() {
            return Err(TrackerError::InvalidIndex {
                index,
                stop_count: self.stops.len(),
            });
        }

        self.state.current_stop_index = index;
        Ok(())
    }

    /// Clear progress back to the first stop. Notes are kept.
    pub fn reset_progress(&mut self) {
        self.state.current_stop_index = 0;
        self.state.completed_stop_ids.clear();
    }

    pub fn is_completed(&self, id: &StopId) -> bool {
        self.state.completed_stop_ids.contains(id)
    }

    pub fn is_finished(&self) -> bool {
        !self.stops.is_empty() && self.stops.iter().all(|s| self.is_completed(&s.id))
    }

    /// Open a stop's note for editing, or close editing with `None`. The id
    /// isn't checked against the stop list.
    pub fn set_editing_note(&mut self, stop_id: Option<StopId>) {
        self.state.editing_note_id = stop_id;
    }

    pub fn editing_note_id(&self) -> Option<&StopId> {
        self.state.editing_note_id.as_ref()
    }

    pub fn update_note(&mut self, stop_id: StopId, text: String) {
        self.state.user_notes.insert(stop_id, text);
    }

    pub fn note(&self, stop_id: &StopId) -> Option<&str> {
        self.state.user_notes.get(stop_id).map(String::as_str)
    }

    /// How far along the route the walker is, for a progress bar.
    pub fn progress_fraction(&self) -> f64 {
        let Some(current) = self.current_stop() else {
            return 0.0;
        };

        let done = usize::from(self.is_completed(&current.id));
        let fraction = (self.state.current_stop_index + done) as f64 / self.stops.len() as f64;
        fraction.min(1.0)
    }

    /// Minutes of travel still ahead, not counting the current stop.
    pub fn remaining_minutes(&self) -> u32 {
        self.stops
            .iter()
            .skip(self.state.current_stop_index + 1)
            .map(|s| s.estimated_time_minutes)
            .fold(0, u32::saturating_add)
    }

    pub fn projected_finish(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.checked_add_signed(TimeDelta::minutes(i64::from(self.remaining_minutes())))
            .unwrap_or(NaiveDateTime::MAX)
    }

    pub fn set_road_plan(&mut self, plan: RoadPlan) {
        self.road = Some(plan);
    }

    pub fn route_polyline(&self) -> &[GeoPoint] {
        self.road
            .as_ref()
            .map(|r| r.polyline.as_slice())
            .unwrap_or_default()
    }

    /// Minutes to show for reaching stop `index`: the routed leg when there is
    /// one, otherwise the stop's own estimate.
    pub fn display_minutes(&self, index: usize) -> Option<u32> {
        let stop = self.stops.get(index)?;
        let routed = self
            .road
            .as_ref()
            .and_then(|r| r.leg_minutes.get(&index).copied());
        Some(routed.unwrap_or(stop.estimated_time_minutes))
    }

    pub fn road_leg_minutes(&self) -> Option<&BTreeMap<usize, u32>> {
        self.road.as_ref().map(|r| &r.leg_minutes)
    }

    /// GeoJSON FeatureCollection of the located stops, for a map layer.
    pub fn to_geojson(&self) -> anyhow::Result<String> {
        let features: Vec<StopFeature> = self
            .stops
            .iter()
            .enumerate()
            .filter_map(|(index, stop)| {
                let point = stop.geo_point?;
                Some(StopFeature {
                    id: stop.id.clone(),
                    name: stop.name.clone(),
                    index,
                    estimated_time_minutes: stop.estimated_time_minutes,
                    completed: self.is_completed(&stop.id),
                    current: index == self.state.current_stop_index,
                    geometry: point.into(),
                })
            })
            .collect();

        geojson::ser::to_feature_collection_string(&features).context("Failed to serialize")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn stops(n: usize) -> Vec<Stop> {
        (0..n)
            .map(|i| {
                Stop::new(StopId::new(&format!("s{i}")), format!("Stop {i}"), String::new())
                    .with_estimated_time(10 * i as u32)
            })
            .collect()
    }

    #[test]
    fn test_jump_to_in_range() {
        let mut tracker = RouteProgressTracker::new(stops(4));
        for i in 0..4 {
            tracker.jump_to(i);
            assert_eq!(tracker.current_stop_index(), i);
        }
    }

    #[test]
    fn test_jump_to_out_of_range_is_ignored() {
        let mut tracker = RouteProgressTracker::new(stops(3));
        tracker.jump_to(1);
        tracker.jump_to(3);
        tracker.jump_to(usize::MAX);
        assert_eq!(tracker.current_stop_index(), 1);
    }

    #[test]
    fn test_try_jump_to_reports_invalid_index() {
        let mut tracker = RouteProgressTracker::new(stops(3));
        assert_eq!(
            tracker.try_jump_to(5),
            Err(TrackerError::InvalidIndex {
                index: 5,
                stop_count: 3
            })
        );
        assert_eq!(tracker.current_stop_index(), 0);
        assert_eq!(tracker.try_jump_to(2), Ok(()));
        assert_eq!(tracker.current_stop_index(), 2);
    }

    #[test]
    fn test_complete_advances_atomically() {
        let mut tracker = RouteProgressTracker::new(stops(3));
        tracker.complete_current_stop();
        assert_eq!(tracker.current_stop_index(), 1);
        assert!(tracker.is_completed(&StopId::new("s0")));
        assert!(!tracker.is_completed(&StopId::new("s1")));
    }

    #[test]
    fn test_complete_last_stop_is_idempotent() {
        let mut tracker = RouteProgressTracker::new(stops(3));
        tracker.jump_to(2);
        tracker.complete_current_stop();
        let once = tracker.state().completed_stop_ids.clone();
        tracker.complete_current_stop();

        assert_eq!(tracker.current_stop_index(), 2);
        assert_eq!(tracker.state().completed_stop_ids, once);
        assert_eq!(once, HashSet::from([StopId::new("s2")]));
    }

    #[test]
    fn test_advance_retreat_round_trip() {
        let mut tracker = RouteProgressTracker::new(stops(4));
        for i in 0..3 {
            tracker.jump_to(i);
            tracker.advance();
            tracker.retreat();
            assert_eq!(tracker.current_stop_index(), i);
        }

        tracker.jump_to(3);
        tracker.advance();
        assert_eq!(tracker.current_stop_index(), 3);

        tracker.jump_to(0);
        tracker.retreat();
        assert_eq!(tracker.current_stop_index(), 0);
    }

    #[test]
    fn test_empty_route() {
        let mut tracker = RouteProgressTracker::new(vec![]);
        tracker.complete_current_stop();
        tracker.advance();
        tracker.retreat();
        tracker.jump_to(0);

        assert_eq!(tracker.current_stop_index(), 0);
        assert!(tracker.state().completed_stop_ids.is_empty());
        assert_eq!(tracker.progress_fraction(), 0.0);
        assert_eq!(tracker.remaining_minutes(), 0);
        assert!(tracker.current_stop().is_none());
        assert!(!tracker.is_finished());
        assert_eq!(tracker.display_minutes(0), None);
    }

    #[test]
    fn test_progress_fraction() {
        let mut tracker = RouteProgressTracker::new(stops(4));
        assert_eq!(tracker.progress_fraction(), 0.0);

        tracker.complete_current_stop();
        assert_eq!(tracker.progress_fraction(), 0.25);

        tracker.complete_current_stop();
        tracker.complete_current_stop();
        assert_eq!(tracker.progress_fraction(), 0.75);
        assert!(!tracker.is_finished());

        tracker.complete_current_stop();
        assert_eq!(tracker.current_stop_index(), 3);
        assert_eq!(tracker.progress_fraction(), 1.0);
        assert!(tracker.is_finished());
    }

    #[test]
    fn test_remaining_minutes_and_finish() {
        // estimates are 0, 10, 20, 30
        let mut tracker = RouteProgressTracker::new(stops(4));
        assert_eq!(tracker.remaining_minutes(), 60);

        tracker.jump_to(1);
        assert_eq!(tracker.remaining_minutes(), 50);

        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let finish = tracker.projected_finish(now);
        assert_eq!(finish, now + TimeDelta::minutes(50));

        tracker.jump_to(3);
        assert_eq!(tracker.remaining_minutes(), 0);
    }

    #[test]
    fn test_remaining_minutes_saturates() {
        let all = vec![
            Stop::new(StopId::new("a"), "A".to_owned(), String::new()),
            Stop::new(StopId::new("b"), "B".to_owned(), String::new()).with_estimated_time(u32::MAX),
            Stop::new(StopId::new("c"), "C".to_owned(), String::new()).with_estimated_time(1),
        ];
        let tracker = RouteProgressTracker::new(all);
        assert_eq!(tracker.remaining_minutes(), u32::MAX);

        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert!(tracker.projected_finish(now) > now);
        assert_eq!(
            tracker.projected_finish(NaiveDateTime::MAX),
            NaiveDateTime::MAX
        );
    }

    #[test]
    fn test_notes() {
        let mut tracker = RouteProgressTracker::new(stops(2));
        tracker.set_editing_note(Some(StopId::new("s1")));
        assert_eq!(tracker.editing_note_id(), Some(&StopId::new("s1")));

        tracker.update_note(StopId::new("s1"), "great coffee".to_owned());
        tracker.update_note(StopId::new("s1"), "great coffee, slow service".to_owned());
        // unknown ids are accepted
        tracker.update_note(StopId::new("elsewhere"), "?".to_owned());

        assert_eq!(tracker.note(&StopId::new("s1")), Some("great coffee, slow service"));
        assert_eq!(tracker.state().user_notes.len(), 2);

        tracker.set_editing_note(None);
        assert!(tracker.editing_note_id().is_none());
    }

    #[test]
    fn test_reset_progress_keeps_notes() {
        let mut tracker = RouteProgressTracker::new(stops(3));
        tracker.complete_current_stop();
        tracker.update_note(StopId::new("s0"), "done".to_owned());
        tracker.reset_progress();

        assert_eq!(tracker.current_stop_index(), 0);
        assert!(tracker.state().completed_stop_ids.is_empty());
        assert_eq!(tracker.note(&StopId::new("s0")), Some("done"));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut tracker = RouteProgressTracker::new(stops(3));
        tracker.complete_current_stop();
        tracker.update_note(StopId::new("s0"), "nice view".to_owned());

        let json = serde_json::to_string(&tracker.snapshot()).unwrap();
        let state: TrackerState = serde_json::from_str(&json).unwrap();
        let restored = RouteProgressTracker::restore(stops(3), state.clone()).unwrap();
        assert_eq!(restored.state(), tracker.state());

        assert_eq!(
            RouteProgressTracker::restore(stops(1), state).unwrap_err(),
            TrackerError::InvalidIndex {
                index: 1,
                stop_count: 1
            }
        );
        assert!(RouteProgressTracker::restore(vec![], TrackerState::default()).is_ok());
    }

    #[test]
    fn test_display_minutes_prefers_road() {
        let mut tracker = RouteProgressTracker::new(stops(3));
        assert_eq!(tracker.display_minutes(2), Some(20));

        tracker.set_road_plan(RoadPlan {
            polyline: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)],
            leg_minutes: BTreeMap::from([(1, 4)]),
        });
        assert_eq!(tracker.display_minutes(1), Some(4));
        assert_eq!(tracker.display_minutes(2), Some(20));
        assert_eq!(tracker.route_polyline().len(), 2);
    }

    #[test]
    fn test_to_geojson() {
        let mut all = stops(3);
        all[0].geo_point = Some(GeoPoint::new(51.2194, 4.4025));
        all[2].geo_point = Some(GeoPoint::new(51.2211, 4.3997));
        let mut tracker = RouteProgressTracker::new(all);
        tracker.complete_current_stop();

        let json: serde_json::Value = serde_json::from_str(&tracker.to_geojson().unwrap()).unwrap();
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["id"], "s0");
        assert_eq!(features[0]["properties"]["completed"], true);
        assert_eq!(features[1]["properties"]["index"], 2);
        assert_eq!(features[1]["properties"]["current"], false);
        assert_eq!(features[0]["geometry"]["coordinates"][0], 4.4025);
    }
}
