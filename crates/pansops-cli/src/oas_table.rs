//! Reader for the "OAS constants" section of a PANS-OPS OAS CSV export.
//!
//! Sections start with a `---` header line. Inside the constants section each
//! row is a key followed by values, separated by commas, tabs or runs of two or
//! more spaces; the last field is taken as the value. Only the base plane keys
//! `WA` .. `ZC` are kept. Parsing stops at the template coordinates section.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const CONSTANTS_SECTION: &str = "OAS constants";
const STOP_SECTION: &str = "OAS Template coordinates";

pub fn load_oas_constants(path: &Path) -> Result<BTreeMap<String, f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading OAS table {}", path.display()))?;
    Ok(parse_oas_constants(&text))
}

pub fn parse_oas_constants(text: &str) -> BTreeMap<String, f64> {
    let mut table = BTreeMap::new();
    let mut in_constants = false;

    for raw in text.lines() {
        let line = raw.trim().trim_start_matches('\u{feff}');
        if line.is_empty() {
            continue;
        }
        if line.starts_with("---") {
            let section = line.trim_matches(|c: char| c == '-' || c.is_whitespace());
            if section.starts_with(STOP_SECTION) {
                break;
            }
            in_constants = section == CONSTANTS_SECTION;
            continue;
        }
        if !in_constants {
            continue;
        }

        let fields = split_fields(line);
        if fields.len() < 2 {
            continue;
        }
        let key = fields[0];
        if !is_plane_key(key) {
            continue;
        }
        if let Ok(value) = fields[fields.len() - 1].parse::<f64>() {
            table.insert(key.to_string(), value);
        }
    }
    table
}

fn is_plane_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == 2 && b"WXYZ".contains(&bytes[0]) && b"ABC".contains(&bytes[1])
}

fn split_fields(line: &str) -> Vec<&str> {
    let pieces: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split(',').flat_map(|p| p.split("  ")).collect()
    };
    pieces
        .into_iter()
        .map(|p| p.trim().trim_end_matches(','))
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}---Header\n\
        Category,CAT I\n\
        ---OAS constants\n\
        WA,0.0285\n\
        WB,0.0\n\
        WC,-8.01\n\
        W'A,0.0239\n\
        XA  0.027681\n\
        XB  0.1825\n\
        XC  -16.72\n\
        YA\t0.023948\n\
        YB\t0.210054\n\
        YC\t-21.51\n\
        ZA,-0.025,\n\
        ZB,0.0\n\
        ZC,-22.5\n\
        ---OAS Template coordinates -m(meters)\n\
        WA,999\n";

    #[test]
    fn test_parses_all_twelve_constants() {
        let table = parse_oas_constants(SAMPLE);
        assert_eq!(table.len(), 12);
        assert_eq!(table["WA"], 0.0285);
        assert_eq!(table["XC"], -16.72);
        assert_eq!(table["YB"], 0.210054);
        assert_eq!(table["ZA"], -0.025);
        assert!(!table.contains_key("W'A"));
    }

    #[test]
    fn test_rows_outside_the_section_are_ignored() {
        let table = parse_oas_constants("WA,1.0\n---Other\nXA,2.0\n");
        assert!(table.is_empty());
    }

    #[test]
    fn test_non_numeric_values_are_skipped() {
        let table = parse_oas_constants("---OAS constants\nWA,n/a\nWB,0.5\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table["WB"], 0.5);
    }

    #[test]
    fn test_feeds_core_coefficients() {
        let table = parse_oas_constants(SAMPLE);
        let coefficients = pansops_core::OasCoefficients::from_table(&table).unwrap();
        assert_eq!(coefficients.w.c, -8.01);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_oas_constants(Path::new("/nonexistent/pans_oas.csv")).unwrap_err();
        assert!(err.to_string().contains("pans_oas.csv"));
    }
}
