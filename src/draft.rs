use crate::{
    eta::{geocode::Geocoder, EtaEngine},
    route::{
        profile::UserProfile,
        stop::{Stop, StopId},
        Route,
    },
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DraftError {
    #[error("Route needs a name")]
    MissingName,
    #[error("Route needs at least one named stop")]
    NoNamedStops,
}

/// A route being authored. Stops can be added, reordered and edited freely
/// until the draft is turned into a `Route`.
#[derive(Debug, Clone, Default)]
pub struct RouteDraft {
    pub name: String,
    pub theme: String,
    pub description: String,
    pub icon_id: String,
    stops: Vec<Stop>,
    editing_stop_id: Option<StopId>,
}

impl RouteDraft {
    pub fn new() -> Self {
        Self {
            icon_id: "place".to_owned(),
            ..Default::default()
        }
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn editing_stop_id(&self) -> Option<&StopId> {
        self.editing_stop_id.as_ref()
    }

    /// Append an empty stop and open it for editing.
    pub fn add_stop(&mut self, id: StopId) {
        self.stops.push(Stop::new(id.clone(), String::new(), String::new()));
        self.editing_stop_id = Some(id);
    }

    pub fn remove_stop(&mut self, id: &StopId) {
        self.stops.retain(|s| &s.id != id);
    }

    pub fn toggle_edit_stop(&mut self, id: Option<StopId>) {
        self.editing_stop_id = id;
    }

    /// Swap the stop at `index` with its neighbour `direction` places away.
    /// Does nothing if either position is off the list.
    pub fn move_stop(&mut self, index: usize, direction: isize) {
        let Some(target) = index.checked_add_signed(direction) else {
            return;
        };
        if index < self.stops.len() && target < self.stops.len() {
            self.stops.swap(index, target);
        }
    }

    pub fn update_stop_text(&mut self, id: &StopId, name: &str, address: &str, description: &str) {
        if let Some(stop) = self.stops.iter_mut().find(|s| &s.id == id) {
            stop.name = name.to_owned();
            stop.address = address.to_owned();
            stop.description = description.to_owned();
        }
    }

    /// Manual override of a stop's travel time. The next `recalculate` may
    /// replace it.
    pub fn set_stop_time(&mut self, id: &StopId, minutes: u32) {
        if let Some(stop) = self.stops.iter_mut().find(|s| &s.id == id) {
            stop.estimated_time_minutes = minutes;
        }
    }

    pub fn recalculate<G>(&mut self, engine: &EtaEngine, profile: &UserProfile, geocoder: &mut G)
    where
        G: Geocoder + ?Sized,
    {
        self.stops = engine.recalculate_stop_timings(&self.stops, profile, geocoder);
    }

    /// Build the route to publish. Stops without a name are dropped.
    pub fn finalize(&self, author_id: &str) -> Result<Route, DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }

        let stops: Vec<Stop> = self
            .stops
            .iter()
            .filter(|s| !s.name.trim().is_empty())
            .cloned()
            .collect();
        if stops.is_empty() {
            return Err(DraftError::NoNamedStops);
        }

        let mut route = Route::new(self.name.clone(), stops);
        route.theme = if self.theme.trim().is_empty() {
            "Custom".to_owned()
        } else {
            self.theme.clone()
        };
        route.description = self.description.clone();
        route.icon_id = self.icon_id.clone();
        route.author_id = author_id.to_owned();
        Ok(route)
    }
}
