//! CSV dataset loading.
//!
//! Each dataset key maps to `<key>.csv` in the data directory. A missing
//! file means the source is absent and the engine degrades (NaN columns);
//! a present-but-malformed file is an error. Headers are normalized to
//! lowercase snake_case so exports from different upstreams land on the
//! same column names; unparseable cells become NaN, rows without a valid
//! date are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use regime_core::data::DatasetMap;
use regime_core::domain::Dataset;
use tracing::{debug, warn};

/// Dataset keys the engine knows how to use.
pub const DATASET_KEYS: &[&str] = &[
    "btc", "eth", "vix", "btc_cot", "eth_cot", "spx", "nasdaq", "dxy", "us10y",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Load every known dataset present in `dir`.
pub fn load_datasets(dir: &Path) -> Result<DatasetMap> {
    let mut map = DatasetMap::new();
    for &key in DATASET_KEYS {
        let path = dir.join(format!("{key}.csv"));
        if !path.exists() {
            debug!(key, "dataset file absent, skipping");
            continue;
        }
        let dataset = load_csv(&path)
            .with_context(|| format!("loading dataset {key} from {}", path.display()))?;
        debug!(key, rows = dataset.len(), "dataset loaded");
        map.insert(key.to_string(), dataset);
    }
    Ok(map)
}

/// Parse one CSV file into a canonical dataset.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(normalize_header)
        .collect();
    let date_idx = match headers.iter().position(|h| h == "date") {
        Some(i) => i,
        None => bail!("no date column among headers {headers:?}"),
    };

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.context("reading CSV row")?;
        let date = match record.get(date_idx).and_then(parse_date) {
            Some(d) => d,
            None => {
                warn!(path = %path.display(), row = ?record.get(date_idx), "skipping row with unparseable date");
                continue;
            }
        };
        dates.push(date);
        for (i, col) in columns.iter_mut().enumerate() {
            if i == date_idx {
                col.push(f64::NAN);
                continue;
            }
            let value = record
                .get(i)
                .and_then(|s| s.trim().replace(',', "").parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            col.push(value);
        }
    }

    let columns: BTreeMap<String, Vec<f64>> = headers
        .into_iter()
        .zip(columns)
        .filter(|(name, _)| name != "date")
        .collect();
    Ok(Dataset::new(dates, columns))
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("regime-loader-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn headers_normalized_and_values_parsed() {
        let path = write_temp(
            "basic.csv",
            "Date, Close ,Comm Net\n2024-01-02,100.5,-1200\n2024-01-01,99.0,\n",
        );
        let ds = load_csv(&path).unwrap();
        assert!(ds.has_column("close"));
        assert!(ds.has_column("comm_net"));
        // Rows canonicalize sorted ascending.
        assert_eq!(ds.column("close").unwrap()[0], 99.0);
        assert_eq!(ds.column("close").unwrap()[1], 100.5);
        assert!(ds.column("comm_net").unwrap()[0].is_nan());
    }

    #[test]
    fn bad_dates_skipped_slash_formats_accepted() {
        let path = write_temp(
            "dates.csv",
            "date,close\nnot-a-date,1.0\n01/15/2024,2.0\n2024/01/16,3.0\n",
        );
        let ds = load_csv(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("close").unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn missing_date_column_is_an_error() {
        let path = write_temp("nodate.csv", "close,volume\n1.0,2.0\n");
        assert!(load_csv(&path).is_err());
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = std::env::temp_dir().join("regime-loader-empty");
        std::fs::create_dir_all(&dir).unwrap();
        let map = load_datasets(&dir).unwrap();
        assert!(map.is_empty());
    }
}
