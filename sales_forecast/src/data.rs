//! Sales rows and the sufficiency-checked dataset built from them

use crate::error::{PipelineError, Result};
use crate::filters::{Dimension, FilterCriteria};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Minimum number of rows needed to fit a model with yearly seasonality
pub const MIN_OBSERVATIONS: usize = 24;

/// One row of the monthly sales fact table
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub due_date: NaiveDate,
    pub revenue: f64,
    pub sales_amount: f64,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub product_line: Option<String>,
    pub product_category: Option<String>,
}

impl SalesRecord {
    /// Record with the given measures and no dimension values
    pub fn new(due_date: NaiveDate, revenue: f64, sales_amount: f64) -> Self {
        Self {
            due_date,
            revenue,
            sales_amount,
            organization: None,
            country: None,
            region: None,
            state: None,
            city: None,
            product_line: None,
            product_category: None,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Organization => self.organization.as_deref(),
            Dimension::Country => self.country.as_deref(),
            Dimension::Region => self.region.as_deref(),
            Dimension::State => self.state.as_deref(),
            Dimension::City => self.city.as_deref(),
            Dimension::ProductLine => self.product_line.as_deref(),
            Dimension::ProductCategory => self.product_category.as_deref(),
        }
    }

    pub fn set_dimension(&mut self, dimension: Dimension, value: Option<String>) {
        let slot = match dimension {
            Dimension::Organization => &mut self.organization,
            Dimension::Country => &mut self.country,
            Dimension::Region => &mut self.region,
            Dimension::State => &mut self.state,
            Dimension::City => &mut self.city,
            Dimension::ProductLine => &mut self.product_line,
            Dimension::ProductCategory => &mut self.product_category,
        };
        *slot = value;
    }
}

/// Rows matching a set of filters, sorted by due date.
///
/// Only `from_records` builds one, so holding a dataset means it has at
/// least `MIN_OBSERVATIONS` rows.
#[derive(Debug, Clone)]
pub struct FilteredDataset {
    criteria: FilterCriteria,
    records: Vec<SalesRecord>,
}

impl FilteredDataset {
    pub fn from_records(criteria: FilterCriteria, mut records: Vec<SalesRecord>) -> Result<Self> {
        if records.len() < MIN_OBSERVATIONS {
            return Err(PipelineError::InsufficientData {
                rows: records.len(),
                required: MIN_OBSERVATIONS,
                filters: criteria.describe(),
            });
        }

        records.sort_by_key(|r| r.due_date);

        Ok(Self { criteria, records })
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest due date
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.records.first()?.due_date, self.records.last()?.due_date))
    }

    pub fn total_revenue(&self) -> f64 {
        self.records.iter().map(|r| r.revenue).sum()
    }

    /// Records as a polars frame.
    ///
    /// `due_date` is a `Date` column; each dimension is a nullable string
    /// column named by its key.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .ok_or_else(|| PipelineError::Data("Invalid epoch".to_string()))?;

        let days: Vec<i32> = self
            .records
            .iter()
            .map(|r| r.due_date.num_days_from_ce() - epoch.num_days_from_ce())
            .collect();
        let due_date = Series::new("due_date", days).cast(&DataType::Date)?;

        let mut columns = vec![
            due_date,
            Series::new(
                "revenue",
                self.records.iter().map(|r| r.revenue).collect::<Vec<_>>(),
            ),
            Series::new(
                "sales_amount",
                self.records.iter().map(|r| r.sales_amount).collect::<Vec<_>>(),
            ),
        ];

        for dimension in Dimension::ALL {
            let values: Vec<Option<&str>> =
                self.records.iter().map(|r| r.dimension(dimension)).collect();
            columns.push(Series::new(dimension.key(), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(count: usize) -> Vec<SalesRecord> {
        (0..count)
            .map(|i| {
                let year = 2020 + (i / 12) as i32;
                let month = (i % 12) as u32 + 1;
                let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
                SalesRecord::new(date, 100.0 + i as f64, 1.0)
            })
            .rev()
            .collect()
    }

    #[test]
    fn test_rejects_fewer_than_minimum() {
        let criteria = FilterCriteria::new().with(Dimension::Country, "Germany");
        let err = FilteredDataset::from_records(criteria, records(23)).unwrap_err();

        match err {
            PipelineError::InsufficientData { rows, required, filters } => {
                assert_eq!(rows, 23);
                assert_eq!(required, MIN_OBSERVATIONS);
                assert_eq!(filters, vec![(Dimension::Country, "Germany".to_string())]);
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_sorts_by_due_date() {
        let dataset = FilteredDataset::from_records(FilterCriteria::new(), records(24)).unwrap();
        let dates: Vec<_> = dataset.records().iter().map(|r| r.due_date).collect();

        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            dataset.date_range(),
            Some((
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 12, 1).unwrap()
            ))
        );
    }

    #[test]
    fn test_dimension_accessors() {
        let mut record = SalesRecord::new(NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(), 1.0, 1.0);
        record.set_dimension(Dimension::City, Some("Hamburg".to_string()));
        assert_eq!(record.dimension(Dimension::City), Some("Hamburg"));
        assert_eq!(record.dimension(Dimension::State), None);
    }

    #[test]
    fn test_to_dataframe() {
        let dataset = FilteredDataset::from_records(FilterCriteria::new(), records(30)).unwrap();
        let df = dataset.to_dataframe().unwrap();

        assert_eq!(df.height(), 30);
        assert_eq!(df.width(), 3 + Dimension::ALL.len());
        assert_eq!(df.column("due_date").unwrap().dtype(), &DataType::Date);
        let total: f64 = df.column("revenue").unwrap().f64().unwrap().sum().unwrap();
        assert!((total - dataset.total_revenue()).abs() < 1e-9);
    }
}
