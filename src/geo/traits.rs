// Place lookup trait — swap-ready abstraction.
//
// Like the scorer and template seams, this keeps geographic data out of the
// core logic. The default implementation is a static table; a gazetteer or a
// cached geocoder can be dropped in without touching scoring or clustering.

/// A place name resolved to canonical coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlace {
    /// Canonical display name ("Mumbai", not "bombay, india")
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolves free-form place names to coordinates.
///
/// Implementations must be deterministic: the same name always resolves to
/// the same place, or never resolves.
pub trait PlaceLookup: Send + Sync {
    fn resolve(&self, name: &str) -> Option<ResolvedPlace>;
}
