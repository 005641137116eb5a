#![allow(dead_code)]

use chrono::NaiveDate;
use sales_forecast::config::ConnectorOptions;
use sales_forecast::series::add_months;
use sales_forecast::Connector;
use tempfile::TempDir;

/// A row to insert into the fixture table
pub struct Row {
    pub due_date: String,
    pub revenue: f64,
    pub country: &'static str,
    pub city: &'static str,
    pub product_line: &'static str,
}

/// `count` consecutive month-end rows starting at `start`
pub fn monthly_rows(
    start: NaiveDate,
    count: usize,
    country: &'static str,
    city: &'static str,
    product_line: &'static str,
    revenue: impl Fn(usize) -> f64,
) -> Vec<Row> {
    (0..count)
        .map(|i| Row {
            due_date: add_months(start, i as i32).format("%Y-%m-%d").to_string(),
            revenue: revenue(i),
            country,
            city,
            product_line,
        })
        .collect()
}

/// Seasonal revenue with a mild upward trend
pub fn seasonal_revenue(i: usize) -> f64 {
    let season = (2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0).cos();
    let wobble = ((i * 37) % 11) as f64 - 5.0;
    10_000.0 + 40.0 * i as f64 + 1_500.0 * season + 60.0 * wobble
}

/// An on-disk SQLite sales database that lives as long as the fixture
pub struct SalesDb {
    pub connector: Connector,
    _dir: TempDir,
}

impl SalesDb {
    pub async fn with_rows(rows: &[Row]) -> Self {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("sales.db").display());
        let connector = Connector::from_url(&url, &ConnectorOptions::default()).unwrap();

        connector
            .with_connection(|conn| {
                Box::pin(async move {
                    sqlx::query(
                        r#"CREATE TABLE "DataSet_Monthly_Sales_and_Quota" (
                            "Calendar DueDate" TEXT NOT NULL,
                            "Revenue EUR" REAL,
                            "Sales Amount" REAL,
                            "Sales Organisation" TEXT,
                            "Sales Country" TEXT,
                            "Sales Region" TEXT,
                            "Sales City" TEXT,
                            "Sales State" TEXT,
                            "Product Line" TEXT,
                            "Product Category" TEXT
                        )"#,
                    )
                    .execute(conn)
                    .await?;
                    Ok(())
                })
            })
            .await
            .unwrap();

        for row in rows {
            let due_date = row.due_date.clone();
            let revenue = row.revenue;
            let country = row.country.to_string();
            let city = row.city.to_string();
            let product_line = row.product_line.to_string();

            connector
                .with_connection(move |conn| {
                    Box::pin(async move {
                        sqlx::query(
                            r#"INSERT INTO "DataSet_Monthly_Sales_and_Quota"
                               ("Calendar DueDate", "Revenue EUR", "Sales Amount",
                                "Sales Organisation", "Sales Country", "Sales Region",
                                "Sales City", "Sales State", "Product Line", "Product Category")
                               VALUES ($1, $2, $3, 'Europe', $4, 'EMEA', $5, 'N/A', $6, 'General')"#,
                        )
                        .bind(due_date)
                        .bind(revenue)
                        .bind(revenue / 100.0)
                        .bind(country)
                        .bind(city)
                        .bind(product_line)
                        .execute(conn)
                        .await?;
                        Ok(())
                    })
                })
                .await
                .unwrap();
        }

        Self {
            connector,
            _dir: dir,
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
