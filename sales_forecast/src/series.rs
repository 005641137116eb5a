//! Gapless monthly revenue series
//!
//! Every point is labelled by the last day of its month. `prepare` turns a
//! filtered dataset into a series with one value per month between the
//! first and last due date, summing rows that share a month and filling
//! months without rows with zero.

use crate::data::FilteredDataset;
use crate::error::{PipelineError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    // Only December of the last representable year has no following month
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Month end `months` months after the month containing `date`.
///
/// Offsets past the calendar range chrono can represent saturate at its
/// first or last month end.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    from_month_index(month_index(date).saturating_add(months))
}

/// Months since year zero; consecutive months differ by one
fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn from_month_index(index: i32) -> NaiveDate {
    let index = index.clamp(month_index(NaiveDate::MIN), month_index(NaiveDate::MAX));
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(month_end)
        .unwrap_or(NaiveDate::MAX)
}

/// Revenue per month over a contiguous range of month ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Series starting at the month containing `start`.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(PipelineError::Data(
                "A monthly series needs at least one value".to_string(),
            ));
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::Data(format!(
                "Non-finite value at position {} of the monthly series",
                position
            )));
        }

        Ok(Self {
            start: month_end(start),
            values,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        add_months(self.start, self.values.len() as i32 - 1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        (0..self.values.len())
            .map(|i| add_months(self.start, i as i32))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &value)| (add_months(self.start, i as i32), value))
    }

    /// Value for the month containing `month`
    pub fn get(&self, month: NaiveDate) -> Option<f64> {
        let offset = month_index(month) - month_index(self.start);
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.values.get(i).copied())
    }

    /// The `count` month ends following the last observation
    pub fn next_months(&self, count: usize) -> Vec<NaiveDate> {
        let end = self.end();
        (1..=count).map(|i| add_months(end, i as i32)).collect()
    }

    /// Mean value per calendar month, January first, for months present
    pub fn seasonal_profile(&self) -> Vec<(u32, f64)> {
        let mut sums = [0.0; 12];
        let mut counts = [0usize; 12];
        for (month, value) in self.iter() {
            let slot = month.month0() as usize;
            sums[slot] += value;
            counts[slot] += 1;
        }

        (0..12)
            .filter(|&i| counts[i] > 0)
            .map(|i| (i as u32 + 1, sums[i] / counts[i] as f64))
            .collect()
    }
}

/// Aggregate a dataset into a gapless monthly revenue series.
pub fn prepare(dataset: &FilteredDataset) -> Result<MonthlySeries> {
    let records = dataset.records();
    let (first, last) = dataset
        .date_range()
        .ok_or_else(|| PipelineError::Data("Cannot prepare an empty dataset".to_string()))?;

    let frame = df!(
        "month_key" => records.iter().map(|r| month_index(r.due_date)).collect::<Vec<i32>>(),
        "revenue" => records.iter().map(|r| r.revenue).collect::<Vec<f64>>()
    )?;

    let monthly = frame
        .lazy()
        .groupby([col("month_key")])
        .agg([col("revenue").sum()])
        .collect()?;

    let start_key = month_index(first);
    let span = (month_index(last) - start_key + 1) as usize;
    let mut values = vec![0.0; span];

    let keys = monthly.column("month_key")?.i32()?;
    let sums = monthly.column("revenue")?.f64()?;
    for (key, sum) in keys.into_iter().zip(sums.into_iter()) {
        if let (Some(key), Some(sum)) = (key, sum) {
            let slot = (key - start_key) as usize;
            if let Some(value) = values.get_mut(slot) {
                *value = sum;
            }
        }
    }

    let observed = monthly.height();
    debug!(
        months = span,
        observed,
        filled = span - observed.min(span),
        "Prepared monthly series"
    );

    MonthlySeries::new(first, values)
}
