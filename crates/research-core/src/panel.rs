use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ResearchError;
use crate::types::PriceBar;

/// Ordered OHLCV history for one symbol, stored as parallel columns.
///
/// Dates are strictly increasing with no duplicates; calendar gaps are
/// tolerated. Lookup by date is O(log n), by position O(1). The optional
/// `mansfield_rs` column is attached by the indicator layer so detectors
/// can read it through the plain panel reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    adj_close: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mansfield_rs: Option<Vec<f64>>,
}

impl PricePanel {
    /// Build a panel from dated bars. Fails with `InputShape` on
    /// non-monotonic dates or negative prices/volume.
    pub fn from_bars(bars: &[PriceBar]) -> Result<Self, ResearchError> {
        let mut panel = Self {
            dates: Vec::with_capacity(bars.len()),
            open: Vec::with_capacity(bars.len()),
            high: Vec::with_capacity(bars.len()),
            low: Vec::with_capacity(bars.len()),
            close: Vec::with_capacity(bars.len()),
            volume: Vec::with_capacity(bars.len()),
            adj_close: Vec::with_capacity(bars.len()),
            mansfield_rs: None,
        };
        for bar in bars {
            panel.dates.push(bar.date);
            panel.open.push(bar.open);
            panel.high.push(bar.high);
            panel.low.push(bar.low);
            panel.close.push(bar.close);
            panel.volume.push(bar.volume);
            panel.adj_close.push(bar.adj_close.unwrap_or(bar.close));
        }
        panel.validate()?;
        Ok(panel)
    }

    /// Build from raw columns. `adj_close` falls back to `close`.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
        adj_close: Option<Vec<f64>>,
    ) -> Result<Self, ResearchError> {
        let adj_close = adj_close.unwrap_or_else(|| close.clone());
        let panel = Self {
            dates,
            open,
            high,
            low,
            close,
            volume,
            adj_close,
            mansfield_rs: None,
        };
        panel.validate()?;
        Ok(panel)
    }

    /// Check the input-shape rules: equal column lengths, strictly
    /// increasing dates, non-negative prices and volume.
    pub fn validate(&self) -> Result<(), ResearchError> {
        let n = self.dates.len();
        let columns = [
            ("open", &self.open),
            ("high", &self.high),
            ("low", &self.low),
            ("close", &self.close),
            ("volume", &self.volume),
            ("adj_close", &self.adj_close),
        ];
        for (name, col) in &columns {
            if col.len() != n {
                return Err(ResearchError::InputShape(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    col.len(),
                    n
                )));
            }
        }
        for w in self.dates.windows(2) {
            if w[1] <= w[0] {
                return Err(ResearchError::InputShape(format!(
                    "dates not strictly increasing at {}",
                    w[1]
                )));
            }
        }
        for (name, col) in &columns {
            if col.iter().any(|v| *v < 0.0) {
                return Err(ResearchError::InputShape(format!(
                    "column '{}' contains negative values",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn open(&self) -> &[f64] {
        &self.open
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    pub fn adj_close(&self) -> &[f64] {
        &self.adj_close
    }

    /// Position of `date` in the panel, if a bar exists for it.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Closing price on `date`, if a bar exists for it.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).map(|i| self.close[i])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Attach the Mansfield RS derived column (index-aligned, NaN where
    /// undefined).
    pub fn set_mansfield_rs(&mut self, column: Vec<f64>) -> Result<(), ResearchError> {
        if column.len() != self.len() {
            return Err(ResearchError::InputShape(format!(
                "mansfield_rs has {} rows, expected {}",
                column.len(),
                self.len()
            )));
        }
        self.mansfield_rs = Some(column);
        Ok(())
    }

    pub fn mansfield_rs(&self) -> Option<&[f64]> {
        self.mansfield_rs.as_deref()
    }

    /// Reconstruct the bar at position `i`.
    pub fn bar(&self, i: usize) -> Option<PriceBar> {
        if i >= self.len() {
            return None;
        }
        Some(PriceBar {
            date: self.dates[i],
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume[i],
            adj_close: Some(self.adj_close[i]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: d(date),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000_000.0,
            adj_close: None,
        }
    }

    #[test]
    fn builds_and_indexes_by_date() {
        let panel =
            PricePanel::from_bars(&[bar("2024-01-02", 100.0), bar("2024-01-03", 101.0)]).unwrap();
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.index_of(d("2024-01-03")), Some(1));
        assert_eq!(panel.index_of(d("2024-01-04")), None);
        assert_eq!(panel.close_on(d("2024-01-02")), Some(100.0));
        // adj_close falls back to close
        assert_eq!(panel.adj_close()[1], 101.0);
    }

    #[test]
    fn rejects_non_monotonic_dates() {
        let err =
            PricePanel::from_bars(&[bar("2024-01-03", 100.0), bar("2024-01-02", 101.0)])
                .unwrap_err();
        assert!(matches!(err, ResearchError::InputShape(_)));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err =
            PricePanel::from_bars(&[bar("2024-01-02", 100.0), bar("2024-01-02", 101.0)])
                .unwrap_err();
        assert!(matches!(err, ResearchError::InputShape(_)));
    }

    #[test]
    fn rejects_negative_prices() {
        let mut b = bar("2024-01-02", 100.0);
        b.low = -1.0;
        let err = PricePanel::from_bars(&[b]).unwrap_err();
        assert!(matches!(err, ResearchError::InputShape(_)));
    }

    #[test]
    fn mansfield_column_must_align() {
        let mut panel =
            PricePanel::from_bars(&[bar("2024-01-02", 100.0), bar("2024-01-03", 101.0)]).unwrap();
        assert!(panel.set_mansfield_rs(vec![0.0]).is_err());
        assert!(panel.set_mansfield_rs(vec![f64::NAN, 1.2]).is_ok());
        assert_eq!(panel.mansfield_rs().unwrap().len(), 2);
    }
}
