//! CSV file bar data adapter.

use crate::domain::bar::Bar;
use crate::domain::error::PapertraderError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvBarAdapter {
    base_path: PathBuf,
}

impl CsvBarAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, PapertraderError> {
        record
            .get(index)
            .ok_or_else(|| PapertraderError::Data {
                reason: format!("missing {} column", name),
            })?
            .parse()
            .map_err(|e| PapertraderError::Data {
                reason: format!("invalid {} value: {}", name, e),
            })
    }
}

impl DataPort for CsvBarAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, PapertraderError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(PapertraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| PapertraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PapertraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp_str = record.get(0).ok_or_else(|| PapertraderError::Data {
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
                .map_err(|e| PapertraderError::Data {
                    reason: format!("invalid timestamp '{}': {}", timestamp_str, e),
                })?;

            let open = Self::parse_field(&record, 1, "open")?;
            let high = Self::parse_field(&record, 2, "high")?;
            let low = Self::parse_field(&record, 3, "low")?;
            let close = Self::parse_field(&record, 4, "close")?;
            let volume = Self::parse_field(&record, 5, "volume")?;

            bars.push(Bar {
                symbol: symbol.to_string(),
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);

        for pair in bars.windows(2) {
            if pair[0].timestamp == pair[1].timestamp {
                return Err(PapertraderError::Data {
                    reason: format!("duplicate timestamp {} in {}", pair[0].timestamp, path.display()),
                });
            }
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, PapertraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PapertraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| PapertraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PapertraderError> {
        let bars = match self.fetch_bars(symbol) {
            Ok(bars) => bars,
            Err(PapertraderError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.timestamp, last.timestamp, bars.len()))),
            _ => Ok(None),
        }
    }
}
