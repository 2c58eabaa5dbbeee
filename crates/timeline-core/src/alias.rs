// crates/timeline-core/src/alias.rs

//! # Field Aliases
//!
//! Export schemas renamed fields between versions. Each logical attribute
//! carries an ordered list of candidate JSON names; the first one present
//! wins. Matching is case-sensitive.

use serde_json::Value;

/// Ordered candidate names for one logical attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub attribute: &'static str,
    pub names: &'static [&'static str],
}

pub const PLACE_ID: FieldAliases = FieldAliases {
    attribute: "place_id",
    names: &["placeId", "placeID"],
};

pub const SEMANTIC_TYPE: FieldAliases = FieldAliases {
    attribute: "semantic_type",
    names: &["semanticType"],
};

pub const LAT_LNG: FieldAliases = FieldAliases {
    attribute: "lat_lng",
    names: &["latLng"],
};

pub const LAT_E7: FieldAliases = FieldAliases {
    attribute: "lat_e7",
    names: &["latitudeE7"],
};

pub const LNG_E7: FieldAliases = FieldAliases {
    attribute: "lng_e7",
    names: &["longitudeE7"],
};

pub const CENTER_LAT_E7: FieldAliases = FieldAliases {
    attribute: "center_lat_e7",
    names: &["centerLatE7"],
};

pub const CENTER_LNG_E7: FieldAliases = FieldAliases {
    attribute: "center_lng_e7",
    names: &["centerLngE7"],
};

pub const START_TIME: FieldAliases = FieldAliases {
    attribute: "start_time",
    names: &["startTime", "startTimestamp"],
};

pub const END_TIME: FieldAliases = FieldAliases {
    attribute: "end_time",
    names: &["endTime", "endTimestamp"],
};

pub const TIMESTAMP: FieldAliases = FieldAliases {
    attribute: "timestamp",
    names: &["timestamp"],
};

pub const TIMESTAMP_MS: FieldAliases = FieldAliases {
    attribute: "timestamp_ms",
    names: &["timestampMs"],
};

/// Every table entry, in declaration order.
pub const ALL: &[FieldAliases] = &[
    PLACE_ID,
    SEMANTIC_TYPE,
    LAT_LNG,
    LAT_E7,
    LNG_E7,
    CENTER_LAT_E7,
    CENTER_LNG_E7,
    START_TIME,
    END_TIME,
    TIMESTAMP,
    TIMESTAMP_MS,
];

/// First non-null value among the aliases.
pub fn lookup<'a>(obj: &'a Value, aliases: &FieldAliases) -> Option<&'a Value> {
    aliases
        .names
        .iter()
        .filter_map(|name| obj.get(name))
        .find(|v| !v.is_null())
}

/// First non-empty string among the aliases.
pub fn lookup_str<'a>(obj: &'a Value, aliases: &FieldAliases) -> Option<&'a str> {
    aliases
        .names
        .iter()
        .filter_map(|name| obj.get(name).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// First JSON number among the aliases.
pub fn lookup_f64(obj: &Value, aliases: &FieldAliases) -> Option<f64> {
    aliases
        .names
        .iter()
        .filter_map(|name| obj.get(name).and_then(Value::as_f64))
        .next()
}

/// Owned non-empty string of a plain field, treating `""` as absent.
pub(crate) fn owned_str(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
