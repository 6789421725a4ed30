//! Built-in city table used when the mapping service is unavailable.

use crate::distance::haversine_km;
use crate::types::{GeocodedLocation, PlaceSuggestion};

struct City {
    name: &'static str,
    state: &'static str,
    latitude: f64,
    longitude: f64,
}

/// Metro areas covering most imaging-market searches.
const CITIES: &[City] = &[
    City { name: "New York", state: "NY", latitude: 40.7128, longitude: -74.0060 },
    City { name: "Los Angeles", state: "CA", latitude: 34.0522, longitude: -118.2437 },
    City { name: "Chicago", state: "IL", latitude: 41.8781, longitude: -87.6298 },
    City { name: "Houston", state: "TX", latitude: 29.7604, longitude: -95.3698 },
    City { name: "Phoenix", state: "AZ", latitude: 33.4484, longitude: -112.0740 },
    City { name: "Philadelphia", state: "PA", latitude: 39.9526, longitude: -75.1652 },
    City { name: "San Antonio", state: "TX", latitude: 29.4241, longitude: -98.4936 },
    City { name: "San Diego", state: "CA", latitude: 32.7157, longitude: -117.1611 },
    City { name: "Dallas", state: "TX", latitude: 32.7767, longitude: -96.7970 },
    City { name: "Austin", state: "TX", latitude: 30.2672, longitude: -97.7431 },
    City { name: "San Jose", state: "CA", latitude: 37.3382, longitude: -121.8863 },
    City { name: "San Francisco", state: "CA", latitude: 37.7749, longitude: -122.4194 },
    City { name: "Seattle", state: "WA", latitude: 47.6062, longitude: -122.3321 },
    City { name: "Denver", state: "CO", latitude: 39.7392, longitude: -104.9903 },
    City { name: "Boston", state: "MA", latitude: 42.3601, longitude: -71.0589 },
    City { name: "Miami", state: "FL", latitude: 25.7617, longitude: -80.1918 },
    City { name: "Atlanta", state: "GA", latitude: 33.7490, longitude: -84.3880 },
    City { name: "Nashville", state: "TN", latitude: 36.1627, longitude: -86.7816 },
    City { name: "Portland", state: "OR", latitude: 45.5152, longitude: -122.6784 },
    City { name: "Minneapolis", state: "MN", latitude: 44.9778, longitude: -93.2650 },
];

/// Reverse lookups beyond this radius have no useful table answer.
const NEAREST_CUTOFF_KM: f64 = 300.0;

const MAX_SUGGESTIONS: usize = 5;

fn formatted(city: &City) -> String {
    format!("{}, {}, USA", city.name, city.state)
}

fn place_id(city: &City) -> String {
    format!(
        "fallback:{}-{}",
        city.name.to_lowercase().replace(' ', "-"),
        city.state.to_lowercase()
    )
}

fn location(city: &City) -> GeocodedLocation {
    GeocodedLocation {
        formatted_address: formatted(city),
        latitude: city.latitude,
        longitude: city.longitude,
    }
}

fn city_matches(city: &City, needle: &str) -> bool {
    city.name.to_lowercase().contains(needle)
        || format!("{}, {}", city.name, city.state)
            .to_lowercase()
            .contains(needle)
}

/// Case-insensitive lookup against the city table.
pub fn lookup(query: &str) -> Option<GeocodedLocation> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    CITIES
        .iter()
        .find(|city| city_matches(city, &needle))
        .map(location)
}

/// Closest table city within the cutoff radius.
pub fn nearest(latitude: f64, longitude: f64) -> Option<GeocodedLocation> {
    CITIES
        .iter()
        .map(|city| {
            (
                city,
                haversine_km(latitude, longitude, city.latitude, city.longitude),
            )
        })
        .filter(|(_, distance)| *distance <= NEAREST_CUTOFF_KM)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(city, _)| location(city))
}

/// Suggestion list for a partial input, capped like the real service.
pub fn suggestions(input: &str) -> Vec<PlaceSuggestion> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    CITIES
        .iter()
        .filter(|city| city_matches(city, &needle))
        .take(MAX_SUGGESTIONS)
        .map(|city| PlaceSuggestion {
            description: formatted(city),
            place_id: place_id(city),
        })
        .collect()
}
