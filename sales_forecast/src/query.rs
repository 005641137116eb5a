//! SQL assembly for the monthly sales fact table
//!
//! Identifiers come from fixed constants; filter values are always bound
//! as positional parameters.

use crate::filters::{Dimension, FilterCriteria};

/// Fact table holding one row per month and dimension combination
pub const SALES_TABLE: &str = "DataSet_Monthly_Sales_and_Quota";
pub const DUE_DATE_COLUMN: &str = "Calendar DueDate";
pub const REVENUE_COLUMN: &str = "Revenue EUR";
pub const SALES_AMOUNT_COLUMN: &str = "Sales Amount";

/// A statement and the values bound to `$1..$n`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub sql: String,
    pub params: Vec<String>,
}

/// Quote an identifier with double quotes
fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Output alias for a dimension column
pub fn alias(dimension: Dimension) -> &'static str {
    dimension.key()
}

fn where_clause(criteria: &FilterCriteria, params: &mut Vec<String>) -> String {
    let mut clause = String::from(" WHERE 1=1");
    for (dimension, value) in criteria.active() {
        params.push(value.to_string());
        clause.push_str(&format!(" AND {} = ${}", quoted(dimension.column()), params.len()));
    }
    clause
}

/// Select every sales row matching `criteria`, oldest first.
pub fn select_sales(criteria: &FilterCriteria) -> SelectQuery {
    let mut projection = vec![
        format!("CAST({} AS TEXT) AS due_date", quoted(DUE_DATE_COLUMN)),
        format!("CAST({} AS DOUBLE PRECISION) AS revenue", quoted(REVENUE_COLUMN)),
        format!(
            "CAST({} AS DOUBLE PRECISION) AS sales_amount",
            quoted(SALES_AMOUNT_COLUMN)
        ),
    ];
    projection.extend(
        Dimension::ALL
            .iter()
            .map(|d| format!("{} AS {}", quoted(d.column()), alias(*d))),
    );

    let mut params = Vec::new();
    let filter = where_clause(criteria, &mut params);

    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} ASC",
        projection.join(", "),
        quoted(SALES_TABLE),
        filter,
        quoted(DUE_DATE_COLUMN)
    );

    SelectQuery { sql, params }
}

/// Values of `dimension` available under the other active filters.
///
/// The dimension's own filter is ignored, and values backed by fewer than
/// `min_rows` rows are left out.
pub fn distinct_values(dimension: Dimension, criteria: &FilterCriteria, min_rows: usize) -> SelectQuery {
    let criteria = criteria.clone().without(dimension);
    let column = quoted(dimension.column());

    let mut params = Vec::new();
    let mut sql = format!(
        "SELECT {} AS value FROM {}{} AND {} IS NOT NULL GROUP BY {}",
        column,
        quoted(SALES_TABLE),
        where_clause(&criteria, &mut params),
        column,
        column
    );

    if min_rows > 1 {
        params.push(min_rows.to_string());
        sql.push_str(&format!(" HAVING COUNT(*) >= CAST(${} AS INTEGER)", params.len()));
    }

    sql.push_str(&format!(" ORDER BY {} ASC", column));

    SelectQuery { sql, params }
}
