// crates/timeline-core/src/aggregate.rs

//! # Aggregator
//!
//! Rolls visits up into place, city and country rows.
//!
//! Place rows are keyed by `placeId`, falling back to the coordinate key.
//! City rows are keyed `"City, Country"` (or just `"City"`), country rows by
//! the bare country name. Visits whose coordinate key is missing from the
//! [`GeoCache`] count toward their place only.

use crate::model::{Aggregates, GeoCache, LocalitySummary, PlaceSummary, Visit};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Insertion-ordered keyed rows.
struct Rows<T> {
    index: HashMap<String, usize>,
    rows: Vec<T>,
}

impl<T> Rows<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn upsert(&mut self, key: &str, create: impl FnOnce() -> T) -> &mut T {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.rows.push(create());
                self.index.insert(key.to_owned(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[idx]
    }
}

fn locality_row(name: &str) -> LocalitySummary {
    LocalitySummary {
        name: name.to_owned(),
        visits: 0,
        seconds: 0.0,
    }
}

fn by_rank(a_secs: f64, a_visits: u64, b_secs: f64, b_visits: u64) -> Ordering {
    b_secs
        .total_cmp(&a_secs)
        .then_with(|| b_visits.cmp(&a_visits))
}

/// Builds the three ranked summaries.
pub fn aggregate(visits: &[Visit], geo_cache: &GeoCache) -> Aggregates {
    let mut places: Rows<PlaceSummary> = Rows::new();
    let mut cities: Rows<LocalitySummary> = Rows::new();
    let mut countries: Rows<LocalitySummary> = Rows::new();

    for visit in visits {
        let coord_key = visit.coord_key();
        let locality = geo_cache.get(&coord_key);
        let city = locality.and_then(|l| l.city.as_deref()).filter(|s| !s.is_empty());
        let country = locality.and_then(|l| l.country.as_deref()).filter(|s| !s.is_empty());
        let seconds = if visit.seconds.is_finite() { visit.seconds } else { 0.0 };

        let place_key = visit
            .place_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(coord_key.as_str());
        let place = places.upsert(place_key, || PlaceSummary {
            key: place_key.to_owned(),
            name: visit.display_name(),
            lat: visit.lat,
            lng: visit.lng,
            visits: 0,
            seconds: 0.0,
            city: None,
            country: None,
        });
        place.visits += 1;
        place.seconds += seconds;
        if place.city.is_none() {
            place.city = city.map(str::to_owned);
        }
        if place.country.is_none() {
            place.country = country.map(str::to_owned);
        }

        if let Some(city) = city {
            let key = match country {
                Some(country) => format!("{city}, {country}"),
                None => city.to_owned(),
            };
            let row = cities.upsert(&key, || locality_row(&key));
            row.visits += 1;
            row.seconds += seconds;
        }

        if let Some(country) = country {
            let row = countries.upsert(country, || locality_row(country));
            row.visits += 1;
            row.seconds += seconds;
        }
    }

    let mut out = Aggregates {
        countries: countries.rows,
        cities: cities.rows,
        places: places.rows,
    };
    out.countries
        .sort_by(|a, b| by_rank(a.seconds, a.visits, b.seconds, b.visits));
    out.cities
        .sort_by(|a, b| by_rank(a.seconds, a.visits, b.seconds, b.visits));
    out.places
        .sort_by(|a, b| by_rank(a.seconds, a.visits, b.seconds, b.visits));

    debug!(
        places = out.places.len(),
        cities = out.cities.len(),
        countries = out.countries.len(),
        "aggregated visits"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Locality, VisitKind};

    fn visit(lat: f64, lng: f64, place_id: Option<&str>, name: Option<&str>, seconds: f64) -> Visit {
        Visit {
            kind: VisitKind::PlaceVisit,
            lat,
            lng,
            place_id: place_id.map(str::to_owned),
            name: name.map(str::to_owned),
            address: None,
            start: None,
            end: None,
            seconds,
        }
    }

    fn cache() -> GeoCache {
        let mut cache = GeoCache::new();
        cache.insert(
            "48.8566,2.3522".into(),
            Locality {
                city: Some("Paris".into()),
                country: Some("France".into()),
            },
        );
        cache.insert(
            "45.764,4.8357".into(),
            Locality {
                city: Some("Lyon".into()),
                country: Some("France".into()),
            },
        );
        cache.insert(
            "1,1".into(),
            Locality {
                city: None,
                country: Some("Nowhere".into()),
            },
        );
        cache
    }

    #[test]
    fn same_place_id_merges_first_name_wins() {
        let visits = [
            visit(48.8566, 2.3522, Some("p1"), Some("First"), 100.0),
            visit(48.8566, 2.3522, Some("p1"), Some("Second"), 50.0),
        ];
        let agg = aggregate(&visits, &GeoCache::new());
        assert_eq!(agg.places.len(), 1);
        let p = &agg.places[0];
        assert_eq!(p.key, "p1");
        assert_eq!(p.name, "First");
        assert_eq!(p.visits, 2);
        assert_eq!(p.seconds, 150.0);
        assert!(agg.cities.is_empty());
        assert!(agg.countries.is_empty());
    }

    #[test]
    fn rolls_up_cities_and_countries() {
        let visits = [
            visit(48.8566, 2.3522, None, None, 600.0),
            visit(45.764, 4.8357, None, Some("Bellecour"), 1200.0),
            visit(48.85661, 2.35219, None, None, 60.0),
        ];
        let agg = aggregate(&visits, &cache());

        assert_eq!(agg.countries.len(), 1);
        assert_eq!(agg.countries[0].name, "France");
        assert_eq!(agg.countries[0].visits, 3);
        assert_eq!(agg.countries[0].seconds, 1860.0);

        let cities: Vec<_> = agg.cities.iter().map(|c| (c.name.as_str(), c.visits)).collect();
        assert_eq!(cities, [("Lyon, France", 1), ("Paris, France", 2)]);

        // Same coordinate key without placeId shares one place row.
        assert_eq!(agg.places.len(), 2);
        assert_eq!(agg.places[1].key, "48.8566,2.3522");
        assert_eq!(agg.places[1].name, "48.8566,2.3522");
        assert_eq!(agg.places[1].city.as_deref(), Some("Paris"));
    }

    #[test]
    fn city_without_country_and_country_without_city() {
        let mut cache = cache();
        cache.insert(
            "2,2".into(),
            Locality {
                city: Some("Atlantis".into()),
                country: None,
            },
        );
        let visits = [visit(2.0, 2.0, None, None, 10.0), visit(1.0, 1.0, None, None, 5.0)];
        let agg = aggregate(&visits, &cache);
        assert_eq!(agg.cities.len(), 1);
        assert_eq!(agg.cities[0].name, "Atlantis");
        assert_eq!(agg.countries.len(), 1);
        assert_eq!(agg.countries[0].name, "Nowhere");
    }

    #[test]
    fn locality_backfills_once_known() {
        let visits = [
            visit(0.0, 0.0, Some("p"), None, 1.0),
            visit(48.8566, 2.3522, Some("p"), None, 1.0),
            visit(45.764, 4.8357, Some("p"), None, 1.0),
        ];
        let agg = aggregate(&visits, &cache());
        let p = &agg.places[0];
        assert_eq!(p.city.as_deref(), Some("Paris"));
        assert_eq!(p.country.as_deref(), Some("France"));
        assert_eq!((p.lat, p.lng), (0.0, 0.0));
    }

    #[test]
    fn ties_on_seconds_break_by_visits() {
        let visits = [
            visit(0.0, 0.0, Some("a"), None, 100.0),
            visit(0.0, 0.0, Some("b"), None, 50.0),
            visit(0.0, 0.0, Some("b"), None, 50.0),
            visit(0.0, 0.0, Some("c"), None, 500.0),
        ];
        let agg = aggregate(&visits, &GeoCache::new());
        let keys: Vec<_> = agg.places.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["c", "b", "a"]);
    }
}
