// crates/timeline-core/src/detect.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The known export shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// On-device timeline export, top-level array of segments.
    DeviceExportArray,
    /// On-device timeline export, `{ "semanticSegments": [...] }`.
    DeviceExportObject,
    /// Takeout semantic history, `{ "timelineObjects": [...] }`.
    SemanticTakeout,
    /// Takeout raw records, `{ "locations": [...] }`.
    RecordsTakeout,
    Unknown,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::DeviceExportArray => "device_export_array",
            DataType::DeviceExportObject => "device_export_object",
            DataType::SemanticTakeout => "semantic_takeout",
            DataType::RecordsTakeout => "records_takeout",
            DataType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a parsed document by its top-level shape.
pub fn detect_type(doc: &Value) -> DataType {
    let has_array = |field: &str| doc.get(field).is_some_and(Value::is_array);

    if doc.is_array() {
        DataType::DeviceExportArray
    } else if has_array("semanticSegments") {
        DataType::DeviceExportObject
    } else if has_array("timelineObjects") {
        DataType::SemanticTakeout
    } else if has_array("locations") {
        DataType::RecordsTakeout
    } else {
        DataType::Unknown
    }
}
