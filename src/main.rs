extern crate log;
pub mod convert;
pub mod geocode;
pub mod geofile;
pub mod record;
use crate::convert::config::ConversionConfig;
use crate::convert::converter::convert;
use crate::geocode::nominatim::fill_missing_coordinates;
use crate::geofile::geojson::{derive_output_path, write_feature_collection};
use crate::record::reader::read_records;
use anyhow::anyhow;
use clap::Parser;
use std::fs::read_to_string;
use std::path::Path;

/// Convert a delimited file of place records into a GeoJSON FeatureCollection.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input file. The output lands next to it, with the
    /// extension replaced by `.geojson`.
    input_filepath: String,

    /// Path to the conversion config file.
    #[arg(short, long)]
    config_filepath: String,

    /// Look up missing coordinates on Nominatim before converting.
    #[arg(long)]
    geocode_missing: bool,
}

fn try_main(args: Args) -> anyhow::Result<()> {
    if !Path::new(&args.config_filepath).exists() {
        return Err(anyhow!("Config file {} not found", &args.config_filepath));
    }
    let config_contents = read_to_string(&args.config_filepath)?;
    let config: ConversionConfig = serde_yaml::from_str(&config_contents)?;

    let input_filepath = Path::new(&args.input_filepath);
    let mut records = read_records(input_filepath, config.delimiter_byte()?)?;
    log::info!("Read {} records from {:?}", records.len(), input_filepath);

    if args.geocode_missing {
        let filled = fill_missing_coordinates(&mut records, &config)?;
        log::info!("Geocoded {} records without coordinates", filled);
    }

    let record_count = records.len();
    let feature_collection = convert(records, &config)?;
    log::info!(
        "Converted {} of {} records into features",
        feature_collection.features.len(),
        record_count
    );

    let output_filepath = derive_output_path(input_filepath);
    write_feature_collection(feature_collection, &output_filepath)?;
    log::info!("Wrote FeatureCollection to {:?}", output_filepath);
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();

    // A bad invocation exits 84, the convention of this script family.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(84)
        }
    };
    if let Err(e) = try_main(args) {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
