//! Writers for forecast results

use crate::error::Result;
use crate::models::ForecastResult;
use std::io::Write;

/// Header of the CSV export
pub const CSV_HEADER: [&str; 4] = ["Date", "Forecast", "Lower Bound", "Upper Bound"];

/// Write one CSV row per forecast month.
pub fn write_csv<W: Write>(result: &ForecastResult, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for point in &result.points {
        csv.write_record([
            point.month.format("%Y-%m-%d").to_string(),
            format!("{:.2}", point.point),
            format!("{:.2}", point.lower),
            format!("{:.2}", point.upper),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Pretty-printed JSON for a forecast, including its fit diagnostics.
pub fn to_json(result: &ForecastResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coefficients, FitDiagnostics, ForecastPoint};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn result() -> ForecastResult {
        let points = vec![
            ForecastPoint {
                month: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                point: 1000.0,
                lower: 900.5,
                upper: 1099.5,
            },
            ForecastPoint {
                month: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                point: 1010.25,
                lower: 880.0,
                upper: 1140.5,
            },
        ];
        let diagnostics = FitDiagnostics {
            coefficients: Coefficients::default(),
            sigma2: 2.5,
            sse: 10.0,
            observations: 4,
            aic: None,
            evaluations: 0,
            termination: "not required".to_string(),
            accuracy: None,
        };
        ForecastResult::new("SARIMA(0,1,0)(0,0,0,12)", 95.0, points, diagnostics).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let mut buffer = Vec::new();
        write_csv(&result(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(
            text,
            "Date,Forecast,Lower Bound,Upper Bound\n\
             2024-01-31,1000.00,900.50,1099.50\n\
             2024-02-29,1010.25,880.00,1140.50\n"
        );
    }

    #[test]
    fn test_json_contains_points_and_diagnostics() {
        let json = to_json(&result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["points"].as_array().unwrap().len(), 2);
        assert_eq!(value["points"][1]["month"], "2024-02-29");
        assert_eq!(value["diagnostics"]["sigma2"], 2.5);
        assert_eq!(value["confidence_pct"], 95.0);
    }
}
