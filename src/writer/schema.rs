//! Arrow schema of the feature table

use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema};

/// Feature table column names
pub mod feature_columns {
    /// m/z bin centre
    pub const MZ: &str = "mz";
    /// RT bin centre in seconds
    pub const RT: &str = "rt";
    /// Normalized intensity
    pub const INTENSITY: &str = "intensity";
    /// Charge state
    pub const CHARGE: &str = "charge";
    /// Sample identifier, constant within a file
    pub const SAMPLE_ID: &str = "sample_id";
}

/// Metadata keys stored with every feature table
pub mod metadata_keys {
    /// Sample identifier
    pub const SAMPLE_ID: &str = "mzbin:sample_id";
    /// Table layout version
    pub const FORMAT_VERSION: &str = "mzbin:format_version";
    /// Pipeline parameters as JSON
    pub const PARAMS: &str = "mzbin:params";
    /// Creation time (RFC 3339)
    pub const CREATED: &str = "mzbin:created";
}

/// Current feature table layout version
pub const FORMAT_VERSION: &str = "1.0";

/// Build the feature table schema
pub fn create_feature_schema(metadata: HashMap<String, String>) -> Schema {
    Schema::new_with_metadata(
        vec![
            Field::new(feature_columns::MZ, DataType::Float64, false),
            Field::new(feature_columns::RT, DataType::Float64, false),
            Field::new(feature_columns::INTENSITY, DataType::Float64, false),
            Field::new(feature_columns::CHARGE, DataType::Int32, false),
            Field::new(feature_columns::SAMPLE_ID, DataType::Utf8, false),
        ],
        metadata,
    )
}

/// Feature table schema without metadata, shared
pub fn create_feature_schema_arc() -> Arc<Schema> {
    Arc::new(create_feature_schema(HashMap::new()))
}
