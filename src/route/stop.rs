use std::fmt;

use serde::{Deserialize, Serialize};

use crate::route::geo_point::GeoPoint;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    pub fn new(str: &str) -> Self {
        Self(str.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point of interest along a route.
///
/// `estimated_time_minutes` is the travel time to reach this stop from the
/// previous one. `notes` are the author's own notes and are never touched by
/// someone walking the route; walker notes live in the tracker instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub address: String,
    pub description: String,
    pub estimated_time_minutes: u32,
    pub notes: Option<String>,
    pub geo_point: Option<GeoPoint>,
}

impl Stop {
    pub fn new(id: StopId, name: String, address: String) -> Self {
        Self {
            id,
            name,
            address,
            ..Default::default()
        }
    }

    pub fn with_geo_point(mut self, point: GeoPoint) -> Self {
        self.geo_point = Some(point);
        self
    }

    pub fn with_estimated_time(mut self, minutes: u32) -> Self {
        self.estimated_time_minutes = minutes;
        self
    }

    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }
}
