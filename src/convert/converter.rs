use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::Value;
use thiserror::Error;

use super::config::{ConversionConfig, PropertyMap, PropertyRule};
use crate::record::reader::Record;

/// The two failure kinds of a conversion run. Everything else that can go
/// wrong (file I/O, config parsing) belongs to the callers.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConvertError {
    /// Only raised when dropping records with missing coordinates is
    /// disabled; otherwise the record is silently skipped.
    #[error("record {record_index} has no value in coordinate column '{column}'")]
    MissingCoordinates { record_index: usize, column: String },
    /// A present but non-numeric coordinate aborts the whole run.
    #[error(
        "record {record_index} has unparsable value '{value}' in coordinate column '{column}'"
    )]
    InvalidCoordinateFormat {
        record_index: usize,
        column: String,
        value: String,
    },
}

/// Convert records into a FeatureCollection, one point feature per record
/// with usable coordinates. Pure: no I/O, input order preserved unless the
/// config asks for a sort.
pub fn convert(
    records: impl IntoIterator<Item = Record>,
    config: &ConversionConfig,
) -> Result<FeatureCollection, ConvertError> {
    let mut features = Vec::new();
    for (record_index, record) in records.into_iter().enumerate() {
        if let Some(feature) = convert_record(&record, record_index, config)? {
            features.push(feature);
        }
    }
    if let Some(sort_key) = &config.sort_by_property {
        sort_features_by_numeric_property(&mut features, sort_key);
    }
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn convert_record(
    record: &Record,
    record_index: usize,
    config: &ConversionConfig,
) -> Result<Option<Feature>, ConvertError> {
    let raw_longitude = raw_coordinate(record, &config.longitude_column);
    let raw_latitude = raw_coordinate(record, &config.latitude_column);

    // Emptiness of either coordinate is checked before parsing anything, so
    // a record missing one coordinate never trips a parse error on the other.
    if raw_longitude.is_empty() || raw_latitude.is_empty() {
        if config.drop_on_missing_coordinates {
            return Ok(None);
        }
        let column = if raw_longitude.is_empty() {
            &config.longitude_column
        } else {
            &config.latitude_column
        };
        return Err(ConvertError::MissingCoordinates {
            record_index,
            column: column.clone(),
        });
    }

    let longitude = parse_coordinate(raw_longitude, record_index, &config.longitude_column)?;
    let latitude = parse_coordinate(raw_latitude, record_index, &config.latitude_column)?;

    let mut properties = apply_property_rules(record, &config.property_rules);
    if let Some(identity_column) = &config.identity_column {
        let overrides = record
            .get(identity_column)
            .and_then(|identity| config.lookup_table.get(identity));
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                properties.insert(key.clone(), value.clone());
            }
        }
    }

    // GeoJSON coordinate order: longitude first.
    let geometry = Geometry::from(&Point::new(longitude, latitude));
    Ok(Some(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }))
}

fn raw_coordinate<'a>(record: &'a Record, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

fn parse_coordinate(raw: &str, record_index: usize, column: &str) -> Result<f64, ConvertError> {
    raw.trim()
        .parse::<f64>()
        .or(Err(ConvertError::InvalidCoordinateFormat {
            record_index,
            column: column.to_string(),
            value: raw.to_string(),
        }))
}

fn apply_property_rules(record: &Record, rules: &[PropertyRule]) -> PropertyMap {
    let mut properties = PropertyMap::new();
    for rule in rules {
        match rule {
            PropertyRule::Column {
                key,
                column,
                default,
            } => match record.get(column).filter(|value| !value.is_empty()) {
                Some(value) => {
                    properties.insert(key.clone(), Value::String(value.clone()));
                }
                None => {
                    if let Some(default) = default {
                        properties.insert(key.clone(), default.clone());
                    }
                }
            },
            PropertyRule::Constant { key, value } => {
                properties.insert(key.clone(), value.clone());
            }
        }
    }
    properties
}

fn numeric_property(feature: &Feature, key: &str) -> Option<f64> {
    match feature.properties.as_ref()?.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Stable ascending sort; features without a usable value keep their
/// relative order at the end.
fn sort_features_by_numeric_property(features: &mut [Feature], key: &str) {
    features.sort_by(|left, right| {
        let left_key = numeric_property(left, key).unwrap_or(f64::INFINITY);
        let right_key = numeric_property(right, key).unwrap_or(f64::INFINITY);
        left_key
            .partial_cmp(&right_key)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
