use std::fs;
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson};

/// Write the collection to a UTF-8 JSON file, pretty-printed for diffable
/// output. serde_json writes non-ASCII characters literally, not escaped.
pub fn write_feature_collection(
    feature_collection: FeatureCollection,
    output_filepath: &Path,
) -> anyhow::Result<()> {
    let geojson_contents = GeoJson::from(feature_collection);
    let contents = serde_json::to_string_pretty(&geojson_contents)?;
    fs::write(output_filepath, contents)?;
    Ok(())
}

/// Output filename convention: the input path with its extension replaced.
pub fn derive_output_path(input_filepath: &Path) -> PathBuf {
    input_filepath.with_extension("geojson")
}
