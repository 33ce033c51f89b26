use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::anyhow;

/// One input row: column name to raw string value, keyed by the header row.
/// Values may be empty; sparse data is expected.
pub type Record = HashMap<String, String>;

/// Read records from any reader. The first line is the header and defines
/// the column names. The delimiter is configured, never auto-detected.
pub fn records_from_reader<R: Read>(reader: R, delimiter: u8) -> anyhow::Result<Vec<Record>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);
    let mut records = Vec::new();
    for record in csv_reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Read all records from a UTF-8 delimited file.
pub fn read_records(input_filepath: &Path, delimiter: u8) -> anyhow::Result<Vec<Record>> {
    let file = File::open(input_filepath)
        .or(Err(anyhow!("Could not open input file {:?}", input_filepath)))?;
    records_from_reader(file, delimiter)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::records_from_reader;

    #[rstest]
    #[case("fr,lat,long\nNazareth,32.7,35.3\n", b',')]
    #[case("fr|lat|long\nNazareth|32.7|35.3\n", b'|')]
    fn test_delimiters(#[case] contents: &str, #[case] delimiter: u8) {
        let records = records_from_reader(contents.as_bytes(), delimiter).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("fr").unwrap(), "Nazareth");
        assert_eq!(records[0].get("lat").unwrap(), "32.7");
        assert_eq!(records[0].get("long").unwrap(), "35.3");
    }

    #[test]
    fn test_empty_fields_are_preserved() {
        let contents = "fr,lat,long\n,,  \n";
        let records = records_from_reader(contents.as_bytes(), b',').unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("fr").unwrap(), "");
        assert_eq!(records[0].get("lat").unwrap(), "");
        // Whitespace is data until the converter decides otherwise.
        assert_eq!(records[0].get("long").unwrap(), "  ");
    }

    #[test]
    fn test_non_ascii_values() {
        let contents = "fr,lat,long\nBethsaïda,32.910,35.630\n";
        let records = records_from_reader(contents.as_bytes(), b',').unwrap();
        assert_eq!(records[0].get("fr").unwrap(), "Bethsaïda");
    }

    #[test]
    fn test_record_order_matches_file_order() {
        let contents = "fr,lat,long\nA,1.0,2.0\nB,3.0,4.0\nC,5.0,6.0\n";
        let records = records_from_reader(contents.as_bytes(), b',').unwrap();
        let names: Vec<&str> = records
            .iter()
            .map(|record| record.get("fr").unwrap().as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
