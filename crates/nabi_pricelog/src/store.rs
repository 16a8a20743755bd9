use crate::reading::PriceReading;
use nabi_shared_models::{PriceQuote, UNAVAILABLE};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Retention cap for the persisted log.
pub const MAX_ROWS: usize = 500;

const COL_TIMESTAMP: &str = "Timestamp";
const COL_CRYPTO: &str = "Crypto";
const COL_PRICE: &str = "Price (USD)";
const COL_CHANGE: &str = "Change (%)";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Error accessing the price log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error reading or writing the price log: {0}")]
    Polars(#[from] PolarsError),
    #[error("Malformed {column} cell in the price log: {value:?}")]
    Malformed { column: &'static str, value: String },
}

/// The persisted price log: a single CSV file rewritten whole on every cycle,
/// deduplicated on (Timestamp, Crypto) and truncated to the newest rows.
pub struct PriceLogStore {
    path: PathBuf,
}

impl PriceLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge this cycle's rows into the store and rewrite it. Returns the
    /// number of rows retained after dedup and truncation.
    pub fn append(&self, fresh: Vec<PriceReading>) -> Result<usize, StoreError> {
        let existing = if self.path.exists() {
            self.load()?
        } else {
            Vec::new()
        };

        let merged = merge_rows(existing, fresh);
        self.write(&merged)?;

        Ok(merged.len())
    }

    pub fn load(&self) -> Result<Vec<PriceReading>, StoreError> {
        let schema = Schema::from_iter([
            Field::new(COL_TIMESTAMP.into(), DataType::String),
            Field::new(COL_CRYPTO.into(), DataType::String),
            Field::new(COL_PRICE.into(), DataType::String),
            Field::new(COL_CHANGE.into(), DataType::String),
        ]);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_schema(Some(Arc::new(schema)))
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()?;

        let timestamps = df.column(COL_TIMESTAMP)?.str()?;
        let assets = df.column(COL_CRYPTO)?.str()?;
        let prices = df.column(COL_PRICE)?.str()?;
        let changes = df.column(COL_CHANGE)?.str()?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            rows.push(PriceReading {
                timestamp: required_cell(timestamps.get(i), COL_TIMESTAMP)?.to_string(),
                asset: required_cell(assets.get(i), COL_CRYPTO)?.to_string(),
                price: parse_price_cell(required_cell(prices.get(i), COL_PRICE)?)?,
                change_pct: parse_change_cell(required_cell(changes.get(i), COL_CHANGE)?)?,
            });
        }

        Ok(rows)
    }

    fn write(&self, rows: &[PriceReading]) -> Result<(), StoreError> {
        let mut df = DataFrame::new(vec![
            Column::new(
                COL_TIMESTAMP.into(),
                rows.iter().map(|r| r.timestamp.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                COL_CRYPTO.into(),
                rows.iter().map(|r| r.asset.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                COL_PRICE.into(),
                rows.iter().map(|r| r.price_cell()).collect::<Vec<_>>(),
            ),
            Column::new(
                COL_CHANGE.into(),
                rows.iter().map(|r| r.change_cell()).collect::<Vec<_>>(),
            ),
        ])?;

        let mut file = File::create(&self.path)?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

        Ok(())
    }
}

/// Merge policy: concatenate, drop duplicate (timestamp, asset) pairs keeping
/// the newest occurrence, then retain only the last `MAX_ROWS` by position.
pub fn merge_rows(existing: Vec<PriceReading>, fresh: Vec<PriceReading>) -> Vec<PriceReading> {
    let mut combined = existing;
    combined.extend(fresh);

    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(combined.len());
    let mut kept = Vec::with_capacity(combined.len());
    for row in combined.into_iter().rev() {
        if seen.insert((row.timestamp.clone(), row.asset.clone())) {
            kept.push(row);
        }
    }
    kept.reverse();

    let overflow = kept.len().saturating_sub(MAX_ROWS);
    kept.split_off(overflow)
}

fn required_cell<'a>(
    value: Option<&'a str>,
    column: &'static str,
) -> Result<&'a str, StoreError> {
    value.ok_or(StoreError::Malformed {
        column,
        value: String::new(),
    })
}

fn parse_price_cell(value: &str) -> Result<PriceQuote, StoreError> {
    if value == UNAVAILABLE {
        return Ok(PriceQuote::Unavailable);
    }

    value
        .parse()
        .map(PriceQuote::Price)
        .map_err(|_| StoreError::Malformed {
            column: COL_PRICE,
            value: value.to_string(),
        })
}

fn parse_change_cell(value: &str) -> Result<Option<f64>, StoreError> {
    if value == UNAVAILABLE {
        return Ok(None);
    }

    value
        .parse()
        .map(Some)
        .map_err(|_| StoreError::Malformed {
            column: COL_CHANGE,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn reading(timestamp: &str, asset: &str, price: f64) -> PriceReading {
        PriceReading {
            timestamp: timestamp.to_string(),
            asset: asset.to_string(),
            price: PriceQuote::Price(price),
            change_pct: None,
        }
    }

    #[test]
    fn merge_keeps_newest_row_for_duplicate_keys() {
        let existing = vec![
            reading("2026-08-24 12:00:00", "bitcoin", 65000.12345),
            reading("2026-08-24 12:00:00", "ethereum", 3100.5),
        ];
        let fresh = vec![reading("2026-08-24 12:00:00", "bitcoin", 65100.0)];

        let merged = merge_rows(existing, fresh);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].asset, "ethereum");
        assert_eq!(merged[1].asset, "bitcoin");
        assert_eq!(merged[1].price, PriceQuote::Price(65100.0));
    }

    #[test]
    fn merge_truncates_to_the_newest_max_rows() {
        let existing: Vec<PriceReading> = (0..MAX_ROWS)
            .map(|i| reading(&format!("2026-08-24 12:{:02}:{:02}", i / 60, i % 60), "bitcoin", i as f64))
            .collect();
        let fresh = vec![reading("2026-08-25 00:00:00", "bitcoin", 999.0)];

        let merged = merge_rows(existing, fresh);

        assert_eq!(merged.len(), MAX_ROWS);
        // The oldest row fell off the front, the new one sits at the back.
        assert_eq!(merged.first().unwrap().price, PriceQuote::Price(1.0));
        assert_eq!(merged.last().unwrap().timestamp, "2026-08-25 00:00:00");
        assert_eq!(merged.last().unwrap().price, PriceQuote::Price(999.0));
    }

    #[test]
    fn merge_never_produces_duplicate_keys() {
        let fresh = vec![
            reading("2026-08-24 12:00:00", "bitcoin", 1.0),
            reading("2026-08-24 12:00:00", "bitcoin", 2.0),
        ];

        let merged = merge_rows(Vec::new(), fresh);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].price, PriceQuote::Price(2.0));
    }

    #[test]
    fn append_creates_and_reloads_the_store() {
        let dir = TempDir::new().unwrap();
        let store = PriceLogStore::new(dir.path().join("crypto_price_log.csv"));

        let rows = vec![
            PriceReading::observe(
                "2026-08-24 12:00:00".to_string(),
                "bitcoin".to_string(),
                PriceQuote::Price(65000.12345),
                None,
            ),
            PriceReading::observe(
                "2026-08-24 12:00:00".to_string(),
                "ethereum".to_string(),
                PriceQuote::Unavailable,
                None,
            ),
        ];

        assert_eq!(store.append(rows).unwrap(), 2);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].price_cell(), "65000.12345");
        assert_eq!(loaded[0].change_cell(), "N/A");
        assert_eq!(loaded[1].asset, "ethereum");
        assert_eq!(loaded[1].price, PriceQuote::Unavailable);
    }

    #[test]
    fn second_cycle_change_survives_a_reload() {
        let dir = TempDir::new().unwrap();
        let store = PriceLogStore::new(dir.path().join("crypto_price_log.csv"));

        store
            .append(vec![PriceReading::observe(
                "2026-08-24 12:00:00".to_string(),
                "bitcoin".to_string(),
                PriceQuote::Price(65000.12345),
                None,
            )])
            .unwrap();

        store
            .append(vec![PriceReading::observe(
                "2026-08-24 12:01:00".to_string(),
                "bitcoin".to_string(),
                PriceQuote::Price(65100.0),
                Some(65000.12345),
            )])
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].change_cell(), "+0.15366");
    }

    #[test]
    fn repeated_appends_never_exceed_the_cap() {
        let dir = TempDir::new().unwrap();
        let store = PriceLogStore::new(dir.path().join("crypto_price_log.csv"));

        for minute in 0..60 {
            let rows = (0..10)
                .map(|asset| {
                    reading(
                        &format!("2026-08-24 12:{minute:02}:00"),
                        &format!("asset{asset}"),
                        minute as f64,
                    )
                })
                .collect();
            let retained = store.append(rows).unwrap();
            assert!(retained <= MAX_ROWS);
        }

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), MAX_ROWS);

        let mut keys = HashSet::new();
        for row in &loaded {
            assert!(keys.insert((row.timestamp.clone(), row.asset.clone())));
        }
        // The newest cycle survived in full.
        assert_eq!(loaded.last().unwrap().timestamp, "2026-08-24 12:59:00");
    }

    #[test]
    fn malformed_price_cell_is_a_typed_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crypto_price_log.csv");

        let mut file = File::create(&path).unwrap();
        writeln!(file, "Timestamp,Crypto,Price (USD),Change (%)").unwrap();
        writeln!(file, "2026-08-24 12:00:00,bitcoin,not-a-number,N/A").unwrap();
        drop(file);

        let store = PriceLogStore::new(path);
        assert!(matches!(
            store.load(),
            Err(StoreError::Malformed { column, .. }) if column == COL_PRICE
        ));
    }
}
