//! Progress tracking and travel time estimates for walking a route of stops.
//!
//! [`tracker::RouteProgressTracker`] follows a walker through a fixed list of
//! stops. [`eta::EtaEngine`] estimates travel times between stops and
//! refreshes them after edits, geocoding addresses through an injected
//! [`eta::geocode::Geocoder`].

pub mod draft;
pub mod eta;
pub mod road;
pub mod route;
pub mod tracker;
