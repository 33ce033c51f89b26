use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use indicatif::ProgressBar;
use serde::Deserialize;

use crate::convert::config::ConversionConfig;
use crate::record::reader::Record;

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const RETRY_SLEEP: Duration = Duration::from_secs(2);

#[derive(Deserialize, Debug)]
struct SearchHit {
    lon: String,
    lat: String,
}

/// Coordinates of the first hit of a Nominatim search response, if any.
/// Nominatim serializes coordinates as strings.
pub fn parse_search_response(body: &str) -> anyhow::Result<Option<(f64, f64)>> {
    let hits: Vec<SearchHit> = serde_json::from_str(body)?;
    match hits.first() {
        Some(hit) => {
            let longitude = hit.lon.parse::<f64>()?;
            let latitude = hit.lat.parse::<f64>()?;
            Ok(Some((longitude, latitude)))
        }
        None => Ok(None),
    }
}

/// Look up a place name, one blocking call. Transport and status failures
/// are retried after a fixed sleep until the request goes through.
pub fn lookup_place(
    client: &reqwest::blocking::Client,
    place: &str,
) -> anyhow::Result<Option<(f64, f64)>> {
    loop {
        let response = client
            .get(NOMINATIM_SEARCH_URL)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .and_then(|response| response.error_for_status());
        match response {
            Ok(response) => {
                let body = response.text().or(Err(anyhow!("No response text")))?;
                return parse_search_response(&body);
            }
            Err(e) => {
                log::warn!("Nominatim lookup for '{}' failed ({}), retrying", place, e);
                thread::sleep(RETRY_SLEEP);
            }
        }
    }
}

/// Fill empty coordinate columns by looking up the identity column value.
/// Records without a hit are left untouched and logged; the converter will
/// drop them later. Returns the number of records filled.
pub fn fill_missing_coordinates(
    records: &mut [Record],
    config: &ConversionConfig,
) -> anyhow::Result<usize> {
    let identity_column = match &config.identity_column {
        Some(column) => column,
        None => return Err(anyhow!("Geocoding requires an identity column to search by")),
    };
    let client = reqwest::blocking::Client::builder()
        .user_agent("geomark")
        .build()?;

    let progress = ProgressBar::new(records.len() as u64);
    let mut filled = 0;
    for record in records.iter_mut() {
        progress.inc(1);
        if has_coordinates(record, config) {
            continue;
        }
        let place = match record.get(identity_column) {
            Some(place) if !place.is_empty() => place.clone(),
            _ => continue,
        };
        match lookup_place(&client, &place)? {
            Some((longitude, latitude)) => {
                record.insert(config.longitude_column.clone(), longitude.to_string());
                record.insert(config.latitude_column.clone(), latitude.to_string());
                filled += 1;
            }
            None => log::warn!("No Nominatim result for '{}'", place),
        }
    }
    progress.finish_and_clear();
    Ok(filled)
}

fn has_coordinates(record: &Record, config: &ConversionConfig) -> bool {
    let filled = |column: &str| {
        record
            .get(column)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    };
    filled(&config.longitude_column) && filled(&config.latitude_column)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::parse_search_response;

    #[test]
    fn test_parse_search_response_takes_first_hit() {
        let body = r#"[
            {"place_id": 1, "display_name": "Lourdes, France", "lat": "43.0949", "lon": "-0.0457"},
            {"place_id": 2, "display_name": "Lourdes, Canada", "lat": "46.05", "lon": "-73.1"}
        ]"#;
        let (longitude, latitude) = parse_search_response(body).unwrap().unwrap();
        assert_abs_diff_eq!(longitude, -0.0457);
        assert_abs_diff_eq!(latitude, 43.0949);
    }

    #[test]
    fn test_parse_search_response_without_hits() {
        assert_eq!(parse_search_response("[]").unwrap(), None);
    }

    #[test]
    fn test_parse_search_response_rejects_malformed_body() {
        assert!(parse_search_response("<html>rate limited</html>").is_err());
        assert!(parse_search_response(r#"[{"lat": "not a number", "lon": "1.0"}]"#).is_err());
    }
}
