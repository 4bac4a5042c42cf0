//! Bar data access port trait.

use chrono::NaiveDateTime;

use crate::domain::bar::Bar;
use crate::domain::error::PapertraderError;

pub trait DataPort {
    /// All bars for a symbol, ordered ascending by timestamp.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, PapertraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, PapertraderError>;

    /// (first timestamp, last timestamp, bar count), or None when the
    /// symbol has no data.
    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PapertraderError>;
}
