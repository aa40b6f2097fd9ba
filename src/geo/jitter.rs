// Deterministic jitter — small offsets so stacked markers stay visible.
//
// The offset is derived from a SHA-256 digest of the seed input (the event
// id, optionally with the location key), never from a clock or from
// iteration order. The same event lands on the same point in every run.
//
//   angle    = u1 * 2π
//   distance = radius * (0.3 + 0.7 * u2)
//   dlat     = distance * sin(angle)
//   dlon     = distance * cos(angle) * cos(lat)
//
// Since |cos(lat)| <= 1 the offset never exceeds `radius` in degree space.

use sha2::{Digest, Sha256};

use crate::config::JitterSeedStrategy;

/// Minimum share of the radius an offset moves, so jittered points never
/// sit right on top of the canonical marker.
const MIN_DISTANCE_FRACTION: f64 = 0.3;

/// Digest of the seed input. `attempt` salts the input when an earlier
/// attempt collided with a point already placed.
pub fn seed_digest(
    event_id: &str,
    location_key: &str,
    strategy: JitterSeedStrategy,
    attempt: u32,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(event_id.as_bytes());
    if strategy == JitterSeedStrategy::EventIdAndKey {
        hasher.update(b"|");
        hasher.update(location_key.as_bytes());
    }
    if attempt > 0 {
        hasher.update(format!("#{attempt}").as_bytes());
    }
    hasher.finalize().into()
}

/// Uniform value in [0, 1) from eight digest bytes.
fn unit_from(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    let value = u64::from_be_bytes(buf) >> 11;
    value as f64 / (1u64 << 53) as f64
}

/// Offset `(latitude, longitude)` by a digest-derived amount within `radius`.
///
/// The result is clamped into valid coordinate ranges; clamping only moves a
/// point back toward the canonical location.
pub fn jitter(latitude: f64, longitude: f64, radius: f64, digest: &[u8; 32]) -> (f64, f64) {
    let angle = unit_from(&digest[0..8]) * std::f64::consts::TAU;
    let fraction = MIN_DISTANCE_FRACTION + (1.0 - MIN_DISTANCE_FRACTION) * unit_from(&digest[8..16]);
    let distance = radius * fraction;

    let dlat = distance * angle.sin();
    let dlon = distance * angle.cos() * latitude.to_radians().cos();

    (
        (latitude + dlat).clamp(-90.0, 90.0),
        (longitude + dlon).clamp(-180.0, 180.0),
    )
}
