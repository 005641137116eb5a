use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sales_forecast::series::{prepare, MonthlySeries};
use sales_forecast::{FilterCriteria, FilteredDataset, SalesRecord};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Month-end records for 2022 and 2023 with March and April 2023 missing
fn records_with_gap() -> Vec<SalesRecord> {
    let mut records = Vec::new();
    for year in [2022, 2023] {
        for month in 1..=12 {
            if year == 2023 && (month == 3 || month == 4) {
                continue;
            }
            let day = sales_forecast::series::month_end(date(year, month, 1));
            records.push(SalesRecord::new(day, 100.0 * month as f64, 1.0));
        }
    }
    // Duplicate rows for the same month are summed
    records.push(SalesRecord::new(date(2022, 6, 30), 50.0, 1.0));
    records.push(SalesRecord::new(date(2022, 6, 30), 25.0, 1.0));
    records
}

fn dataset() -> FilteredDataset {
    FilteredDataset::from_records(FilterCriteria::new(), records_with_gap()).unwrap()
}

#[test]
fn test_prepare_fills_missing_months_with_zero() {
    let series = prepare(&dataset()).unwrap();

    assert_eq!(series.len(), 24);
    assert_eq!(series.start(), date(2022, 1, 31));
    assert_eq!(series.end(), date(2023, 12, 31));
    assert_eq!(series.get(date(2023, 3, 31)), Some(0.0));
    assert_eq!(series.get(date(2023, 4, 30)), Some(0.0));
    assert_eq!(series.get(date(2023, 5, 31)), Some(500.0));
}

#[test]
fn test_prepare_sums_rows_in_the_same_month() {
    let series = prepare(&dataset()).unwrap();
    assert_eq!(series.get(date(2022, 6, 30)), Some(600.0 + 50.0 + 25.0));
}

#[test]
fn test_prepare_normalises_mid_month_dates() {
    let records: Vec<SalesRecord> = (0..24)
        .map(|i| {
            let first = date(2021 + i / 12, (i % 12) as u32 + 1, 1);
            SalesRecord::new(first, 10.0, 1.0)
        })
        .collect();
    let dataset = FilteredDataset::from_records(FilterCriteria::new(), records).unwrap();
    let series = prepare(&dataset).unwrap();

    assert_eq!(series.len(), 24);
    assert_eq!(series.start(), date(2021, 1, 31));
    assert!(series.values().iter().all(|&v| v == 10.0));
}

#[test]
fn test_prepare_is_deterministic() {
    let first = prepare(&dataset()).unwrap();
    let second = prepare(&dataset()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_months_are_contiguous_month_ends() {
    let series = prepare(&dataset()).unwrap();
    let months = series.months();

    for pair in months.windows(2) {
        assert_eq!(pair[1], sales_forecast::series::add_months(pair[0], 1));
        assert_eq!(pair[1], sales_forecast::series::month_end(pair[1]));
    }
}

#[test]
fn test_prepare_preserves_total_revenue() {
    let dataset = dataset();
    let series = prepare(&dataset).unwrap();

    let series_total: f64 = series.values().iter().sum();
    assert!((dataset.total_revenue() - series_total).abs() < 1e-9);
    assert_eq!(dataset.to_dataframe().unwrap().height(), dataset.len());
}

#[test]
fn test_series_next_months_follow_the_end() {
    let series = MonthlySeries::new(date(2023, 10, 31), vec![1.0, 2.0, 3.0]).unwrap();
    assert_eq!(
        series.next_months(3),
        vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]
    );
}
