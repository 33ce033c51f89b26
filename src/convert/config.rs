use std::collections::HashMap;

use anyhow::anyhow;
use serde::Deserialize;

/// Properties object of a feature, as the geojson crate stores it.
pub type PropertyMap = geojson::JsonObject;

/// Declarative source for one output property.
#[derive(Deserialize, Debug, Clone)]
pub enum PropertyRule {
    /// Copy the value of a column. When the column is absent or empty the
    /// property is left unset, or set to `default` when one is configured.
    Column {
        key: String,
        column: String,
        #[serde(default)]
        default: Option<serde_json::Value>,
    },
    /// Always write a fixed value.
    Constant {
        key: String,
        value: serde_json::Value,
    },
}

fn default_delimiter() -> char {
    ','
}

fn default_drop_on_missing_coordinates() -> bool {
    true
}

/// Per-dataset configuration of the record-to-feature conversion.
#[derive(Deserialize, Debug)]
pub struct ConversionConfig {
    /// Name of the column holding the longitude, in degrees.
    pub longitude_column: String,
    /// Name of the column holding the latitude, in degrees.
    pub latitude_column: String,
    /// Column delimiter of the input file. Comma or pipe depending on the
    /// dataset.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Applied in order; later rules overwrite earlier ones on key collision.
    #[serde(default)]
    pub property_rules: Vec<PropertyRule>,
    /// Column whose value keys into `lookup_table`.
    #[serde(default)]
    pub identity_column: Option<String>,
    /// Pre-authored property overrides for specific known identity values.
    /// Looked-up entries win over column-derived properties.
    #[serde(default)]
    pub lookup_table: HashMap<String, PropertyMap>,
    /// When false, a record with an empty coordinate is an error instead of
    /// being skipped.
    #[serde(default = "default_drop_on_missing_coordinates")]
    pub drop_on_missing_coordinates: bool,
    /// When set, features are sorted ascending by this property interpreted
    /// as a number. Features without a usable value go last.
    #[serde(default)]
    pub sort_by_property: Option<String>,
}

impl ConversionConfig {
    /// The delimiter as the single byte the csv reader expects.
    pub fn delimiter_byte(&self) -> anyhow::Result<u8> {
        u8::try_from(u32::from(self.delimiter)).or(Err(anyhow!(
            "Delimiter {:?} is not a single-byte character",
            self.delimiter
        )))
    }
}
