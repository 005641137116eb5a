//! Filtered retrieval of sales rows

use crate::data::{FilteredDataset, SalesRecord};
use crate::error::{PipelineError, Result};
use crate::filters::{Dimension, FilterCriteria};
use crate::query::{self, SelectQuery};
use crate::store::Connector;
use chrono::NaiveDate;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info};

/// Loads the rows matching a set of filters
#[derive(Debug, Clone)]
pub struct Retriever {
    connector: Connector,
}

impl Retriever {
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Fetch every row matching `criteria`.
    ///
    /// Fails with `InsufficientData` when fewer than the minimum number of
    /// rows match.
    pub async fn fetch(&self, criteria: &FilterCriteria) -> Result<FilteredDataset> {
        let query = query::select_sales(criteria);
        debug!(sql = %query.sql, params = query.params.len(), "Fetching sales rows");

        let rows = self.run(query).await?;
        let records = rows
            .iter()
            .map(parse_record)
            .collect::<Result<Vec<_>>>()?;

        info!(rows = records.len(), filters = criteria.active().count(), "Retrieved sales rows");

        FilteredDataset::from_records(criteria.clone(), records)
    }

    /// Values of `dimension` available under the other filters in `criteria`
    /// that are backed by at least `min_rows` rows.
    pub async fn distinct_values(
        &self,
        dimension: Dimension,
        criteria: &FilterCriteria,
        min_rows: usize,
    ) -> Result<Vec<String>> {
        let query = query::distinct_values(dimension, criteria, min_rows);
        let rows = self.run(query).await?;

        let values = rows
            .iter()
            .map(|row| row.try_get::<String, _>("value"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(%dimension, count = values.len(), "Listed dimension values");
        Ok(values)
    }

    async fn run(&self, query: SelectQuery) -> Result<Vec<AnyRow>> {
        self.connector
            .with_connection(move |conn| {
                Box::pin(async move {
                    let mut statement = sqlx::query(&query.sql);
                    for param in &query.params {
                        statement = statement.bind(param.clone());
                    }
                    Ok(statement.fetch_all(conn).await?)
                })
            })
            .await
    }
}

fn parse_record(row: &AnyRow) -> Result<SalesRecord> {
    let raw_date: String = row.try_get("due_date")?;
    let due_date = parse_due_date(&raw_date)?;

    let revenue: Option<f64> = row.try_get("revenue")?;
    let sales_amount: Option<f64> = row.try_get("sales_amount")?;

    let mut record = SalesRecord::new(
        due_date,
        revenue.unwrap_or(0.0),
        sales_amount.unwrap_or(0.0),
    );
    for dimension in Dimension::ALL {
        let value: Option<String> = row.try_get(query::alias(dimension))?;
        record.set_dimension(dimension, value);
    }

    Ok(record)
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time part.
pub(crate) fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    trimmed
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .ok_or_else(|| PipelineError::Data(format!("Unparseable due date '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2023-01-31", 2023, 1, 31)]
    #[case("2023-02-28 00:00:00", 2023, 2, 28)]
    #[case(" 2024-12-01T00:00:00.000 ", 2024, 12, 1)]
    fn test_parse_due_date(#[case] raw: &str, #[case] y: i32, #[case] m: u32, #[case] d: u32) {
        assert_eq!(parse_due_date(raw).unwrap(), NaiveDate::from_ymd_opt(y, m, d).unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("31/01/2023")]
    #[case("2023-13-01")]
    fn test_parse_due_date_rejects(#[case] raw: &str) {
        assert!(matches!(parse_due_date(raw), Err(PipelineError::Data(_))));
    }
}
