// Static place table — the default PlaceLookup.
//
// Indian cities (with their older names), Indian states, international
// cities and a few country-level fallbacks. Matching is forgiving about case,
// quotes and "City, Country" suffixes, but never guesses: a name that matches
// nothing stays unresolved.

use std::collections::BTreeMap;

use super::traits::{PlaceLookup, ResolvedPlace};

const INDIAN_CITIES: &[(&str, f64, f64)] = &[
    ("Delhi", 28.6139, 77.2090),
    ("New Delhi", 28.6139, 77.2090),
    ("Delhi NCR", 28.6139, 77.2090),
    ("Mumbai", 19.0760, 72.8777),
    ("Chennai", 13.0827, 80.2707),
    ("Bangalore", 12.9716, 77.5946),
    ("Kolkata", 22.5726, 88.3639),
    ("Hyderabad", 17.3850, 78.4867),
    ("Pune", 18.5204, 73.8567),
    ("Ahmedabad", 23.0225, 72.5714),
    ("Jaipur", 26.9124, 75.7873),
    ("Lucknow", 26.8467, 80.9462),
    ("Nagpur", 21.1458, 79.0882),
    ("Surat", 21.1702, 72.8311),
    ("Kanpur", 26.4499, 80.3319),
    ("Indore", 22.7196, 75.8577),
    ("Bhopal", 23.2599, 77.4126),
    ("Visakhapatnam", 17.6868, 83.2185),
    ("Patna", 25.5941, 85.1376),
    ("Vadodara", 22.3072, 73.1812),
    ("Ghaziabad", 28.6692, 77.4538),
    ("Ludhiana", 30.9010, 75.8573),
    ("Coimbatore", 11.0168, 76.9558),
    ("Kochi", 9.9312, 76.2673),
    ("Kozhikode", 11.2588, 75.7804),
    ("Thiruvananthapuram", 8.5241, 76.9366),
    ("Guwahati", 26.1445, 91.7362),
    ("Chandigarh", 30.7333, 76.7794),
];

/// Older or alternate names mapped to their canonical entry.
const ALIASES: &[(&str, &str)] = &[
    ("Bombay", "Mumbai"),
    ("Madras", "Chennai"),
    ("Bengaluru", "Bangalore"),
    ("Calcutta", "Kolkata"),
    ("Baroda", "Vadodara"),
    ("Trivandrum", "Thiruvananthapuram"),
    ("Cochin", "Kochi"),
    ("NYC", "New York"),
    ("Sao Paulo", "São Paulo"),
    ("Bogota", "Bogotá"),
];

const INDIAN_STATES: &[(&str, f64, f64)] = &[
    ("Maharashtra", 19.7515, 75.7139),
    ("Karnataka", 15.3173, 75.7139),
    ("Tamil Nadu", 11.1271, 78.6569),
    ("West Bengal", 22.9868, 87.8550),
    ("Gujarat", 22.2587, 71.1924),
    ("Rajasthan", 27.0238, 74.2179),
    ("Uttar Pradesh", 26.8467, 80.9462),
    ("Madhya Pradesh", 22.9734, 78.6569),
    ("Bihar", 25.0961, 85.3131),
    ("Andhra Pradesh", 15.9129, 79.7400),
    ("Telangana", 18.1124, 79.0193),
    ("Kerala", 10.8505, 76.2711),
    ("Punjab", 31.1471, 75.3412),
    ("Haryana", 29.0588, 76.0856),
    ("Odisha", 20.9517, 85.0985),
    ("Assam", 26.2006, 92.9376),
    ("Jharkhand", 23.6102, 85.2799),
    ("Uttarakhand", 30.0668, 79.0193),
    ("Himachal Pradesh", 31.1048, 77.1734),
    ("Goa", 15.2993, 74.1240),
];

const INTERNATIONAL_CITIES: &[(&str, f64, f64)] = &[
    ("London", 51.5074, -0.1278),
    ("New York", 40.7128, -74.0060),
    ("Dubai", 25.2048, 55.2708),
    ("Karachi", 24.8607, 67.0011),
    ("Islamabad", 33.6844, 73.0479),
    ("Lahore", 31.5497, 74.3436),
    ("Dhaka", 23.8103, 90.4125),
    ("Chittagong", 22.3569, 91.7832),
    ("Kathmandu", 27.7172, 85.3240),
    ("Colombo", 6.9271, 79.8612),
    ("Singapore", 1.3521, 103.8198),
    ("Kuala Lumpur", 3.1390, 101.6869),
    ("Jakarta", -6.2088, 106.8456),
    ("Manila", 14.5995, 120.9842),
    ("Bangkok", 13.7563, 100.5018),
    ("Hanoi", 21.0285, 105.8542),
    ("Ho Chi Minh City", 10.8231, 106.6297),
    ("Seoul", 37.5665, 126.9780),
    ("Tokyo", 35.6762, 139.6503),
    ("Beijing", 39.9042, 116.4074),
    ("Shanghai", 31.2304, 121.4737),
    ("Hong Kong", 22.3193, 114.1694),
    ("Taipei", 25.0330, 121.5654),
    ("Sydney", -33.8688, 151.2093),
    ("Melbourne", -37.8136, 144.9631),
    ("Manchester", 53.4808, -2.2426),
    ("Birmingham", 52.4862, -1.8904),
    ("Paris", 48.8566, 2.3522),
    ("Berlin", 52.5200, 13.4050),
    ("Frankfurt", 50.1109, 8.6821),
    ("Rome", 41.9028, 12.4964),
    ("Milan", 45.4642, 9.1900),
    ("Madrid", 40.4168, -3.7038),
    ("Barcelona", 41.3851, 2.1734),
    ("Moscow", 55.7558, 37.6173),
    ("Abu Dhabi", 24.4539, 54.3773),
    ("Riyadh", 24.7136, 46.6753),
    ("Jeddah", 21.4858, 39.1925),
    ("Doha", 25.2854, 51.5310),
    ("Los Angeles", 34.0522, -118.2437),
    ("Chicago", 41.8781, -87.6298),
    ("Houston", 29.7604, -95.3698),
    ("Miami", 25.7617, -80.1918),
    ("Toronto", 43.6532, -79.3832),
    ("Vancouver", 49.2827, -123.1207),
    ("Mexico City", 19.4326, -99.1332),
    ("São Paulo", -23.5505, -46.6333),
    ("Rio de Janeiro", -22.9068, -43.1729),
    ("Buenos Aires", -34.6037, -58.3816),
    ("Lima", -12.0464, -77.0428),
    ("Santiago", -33.4489, -70.6693),
    ("Bogotá", 4.7110, -74.0721),
    ("Cairo", 30.0444, 31.2357),
    ("Cape Town", -33.9249, 18.4241),
    ("Johannesburg", -26.2041, 28.0473),
    ("Nairobi", -1.2864, 36.8172),
    ("Lagos", 6.5244, 3.3792),
    ("Accra", 5.6037, -0.1870),
];

const COUNTRIES: &[(&str, f64, f64)] = &[
    ("India", 20.5937, 78.9629),
    ("Pakistan", 30.3753, 69.3451),
    ("USA", 39.8283, -98.5795),
    ("UK", 55.3781, -3.4360),
    ("UAE", 23.4241, 53.8478),
];

/// In-memory place table keyed by lowercased name.
#[derive(Debug, Clone)]
pub struct StaticPlaceTable {
    entries: BTreeMap<String, ResolvedPlace>,
    /// Lowercased Indian city names, longest first, for "... India" fragments
    indian_cities: Vec<String>,
}

impl Default for StaticPlaceTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for &(name, lat, lon) in INDIAN_CITIES {
            table = table.with_place(name, lat, lon);
        }
        for &(name, lat, lon) in INDIAN_STATES
            .iter()
            .chain(INTERNATIONAL_CITIES)
            .chain(COUNTRIES)
        {
            table = table.with_place(name, lat, lon);
        }
        for &(alias, canonical) in ALIASES {
            if let Some(place) = table.entries.get(&canonical.to_lowercase()).cloned() {
                table.entries.insert(alias.to_lowercase(), place);
            }
        }

        table.indian_cities = INDIAN_CITIES
            .iter()
            .map(|(name, _, _)| name.to_lowercase())
            .collect();
        table
            .indian_cities
            .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        table
    }
}

impl StaticPlaceTable {
    /// A table with no entries.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            indian_cities: Vec::new(),
        }
    }

    /// Add or replace a place.
    pub fn with_place(mut self, name: &str, latitude: f64, longitude: f64) -> Self {
        self.entries.insert(
            name.trim().to_lowercase(),
            ResolvedPlace {
                name: name.trim().to_string(),
                latitude,
                longitude,
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in name order (aliases included).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedPlace)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn exact(&self, key: &str) -> Option<ResolvedPlace> {
        self.entries.get(key).cloned()
    }
}

impl PlaceLookup for StaticPlaceTable {
    fn resolve(&self, name: &str) -> Option<ResolvedPlace> {
        let cleaned: String = name.chars().filter(|c| *c != '"' && *c != '\'').collect();
        let key = cleaned.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        if let Some(place) = self.exact(&key) {
            return Some(place);
        }

        // "Mumbai, India" / "London, UK"
        if let Some((city, _)) = key.split_once(',') {
            if let Some(place) = self.exact(city.trim()) {
                return Some(place);
            }
        }

        // "south mumbai india", "delhi-india": look for a known Indian city
        // inside the text before falling back to nothing.
        if key.contains("india") {
            let fragment = key.replace("india", " ");
            for city in &self.indian_cities {
                if contains_word(&fragment, city) {
                    return self.exact(city);
                }
            }
        }

        None
    }
}

/// Whether `needle` occurs in `hay` bounded by non-alphanumeric characters.
fn contains_word(hay: &str, needle: &str) -> bool {
    hay.match_indices(needle).any(|(start, _)| {
        let before = hay[..start].chars().next_back();
        let after = hay[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundaries() {
        assert!(contains_word("south mumbai ", "mumbai"));
        assert!(contains_word("delhi-", "delhi"));
        assert!(!contains_word("newdelhi", "delhi"));
    }

    #[test]
    fn empty_name_is_unresolved() {
        let table = StaticPlaceTable::default();
        assert!(table.resolve("   ").is_none());
        assert!(table.resolve("\"\"").is_none());
    }
}
