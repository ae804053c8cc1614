use crate::route::geo_point::GeoPoint;

/// Resolves a free-text address to a coordinate.
///
/// `Ok(None)` means the provider had no match. Network errors and the like
/// come back as `Err`; callers that time out a lookup should report it the
/// same way.
pub trait Geocoder {
    fn geocode(&mut self, address: &str) -> anyhow::Result<Option<GeoPoint>>;
}

impl<F> Geocoder for F
where
    F: FnMut(&str) -> anyhow::Result<Option<GeoPoint>>,
{
    fn geocode(&mut self, address: &str) -> anyhow::Result<Option<GeoPoint>> {
        self(address)
    }
}
