use clap::{Args, Parser, Subcommand, ValueEnum};
use sales_forecast::config::{ConnectorOptions, DatabaseSettings, ForecastConfig};
use sales_forecast::error::Result;
use sales_forecast::export::{to_json, write_csv};
use sales_forecast::{
    Connector, Dimension, FilterCriteria, ForecastPipeline, Forecaster, Retriever,
    MIN_OBSERVATIONS,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Value meaning "no restriction" for a filter
const ALL: &str = "All";

#[derive(Parser)]
#[command(
    name = "sales-forecast",
    about = "Forecast monthly sales revenue for a filtered slice of the sales database",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the database connection and print the server version
    Check,

    /// List the values available for one filter
    Options {
        /// Dimension to list, e.g. country or product_line
        #[arg(short, long)]
        dimension: Dimension,

        #[command(flatten)]
        filters: FilterArgs,

        /// Only list values backed by at least this many rows
        #[arg(long, default_value_t = 1)]
        min_rows: usize,
    },

    /// Forecast revenue for the filtered slice
    Forecast {
        #[command(flatten)]
        filters: FilterArgs,

        /// Months to forecast
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(6..=36))]
        horizon: u32,

        /// Confidence level of the interval, in percent
        #[arg(long, default_value_t = 95, value_parser = clap::value_parser!(u32).range(80..=99))]
        confidence: u32,

        /// Write the result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },
}

#[derive(Args, Default)]
struct FilterArgs {
    #[arg(long)]
    organization: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    product_line: Option<String>,
    #[arg(long)]
    product_category: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        let selections = [
            (Dimension::Organization, &self.organization),
            (Dimension::Country, &self.country),
            (Dimension::Region, &self.region),
            (Dimension::State, &self.state),
            (Dimension::City, &self.city),
            (Dimension::ProductLine, &self.product_line),
            (Dimension::ProductCategory, &self.product_category),
        ];

        selections
            .into_iter()
            .fold(FilterCriteria::new(), |criteria, (dimension, value)| {
                match value.as_deref() {
                    Some(v) if !v.trim().eq_ignore_ascii_case(ALL) => criteria.with(dimension, v),
                    _ => criteria,
                }
            })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

fn connect() -> Result<Connector> {
    let settings = DatabaseSettings::resolve()?;
    let options = ConnectorOptions::resolve()?;
    Connector::connect_lazy(&settings, &options)
}

async fn run(cli: Cli) -> Result<()> {
    let connector = connect()?;

    let outcome = match cli.command {
        Commands::Check => {
            let version = connector.validate().await?;
            println!("Connected to {:?} database: {}", connector.driver(), version);
            Ok(())
        }
        Commands::Options {
            dimension,
            filters,
            min_rows,
        } => {
            let retriever = Retriever::new(connector.clone());
            let values = retriever
                .distinct_values(dimension, &filters.criteria(), min_rows)
                .await?;
            println!("{}", ALL);
            for value in values {
                println!("{}", value);
            }
            Ok(())
        }
        Commands::Forecast {
            filters,
            horizon,
            confidence,
            output,
            format,
        } => {
            connector.validate().await?;
            let pipeline = ForecastPipeline::new(
                Retriever::new(connector.clone()),
                Forecaster::new(ForecastConfig::resolve()?),
            );
            let result = pipeline
                .run(&filters.criteria(), horizon as usize, f64::from(confidence))
                .await?;

            eprintln!(
                "{}: {} rows over {} months ({} to {}), minimum {}",
                result.forecast.model,
                result.rows,
                result.series.len(),
                result.series.start(),
                result.series.end(),
                MIN_OBSERVATIONS
            );

            let mut sink: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(io::stdout().lock()),
            };
            match format {
                Format::Csv => write_csv(&result.forecast, &mut sink)?,
                Format::Json => writeln!(sink, "{}", to_json(&result.forecast)?)?,
            }
            sink.flush()?;
            Ok(())
        }
    };

    connector.close().await;
    outcome
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_means_unset() {
        let args = FilterArgs {
            country: Some("Germany".to_string()),
            city: Some("All".to_string()),
            region: Some(" all ".to_string()),
            ..FilterArgs::default()
        };
        let criteria = args.criteria();

        assert_eq!(criteria.get(Dimension::Country), Some("Germany"));
        assert_eq!(criteria.get(Dimension::City), None);
        assert_eq!(criteria.get(Dimension::Region), None);
    }

    #[test]
    fn test_parses_forecast_arguments() {
        let cli = Cli::try_parse_from([
            "sales-forecast",
            "forecast",
            "--country",
            "Germany",
            "--horizon",
            "24",
            "--confidence",
            "80",
        ])
        .unwrap();

        match cli.command {
            Commands::Forecast {
                horizon, confidence, ..
            } => {
                assert_eq!(horizon, 24);
                assert_eq!(confidence, 80);
            }
            _ => panic!("Expected forecast command"),
        }
    }

    #[test]
    fn test_rejects_horizon_outside_range() {
        assert!(Cli::try_parse_from(["sales-forecast", "forecast", "--horizon", "48"]).is_err());
        assert!(Cli::try_parse_from(["sales-forecast", "forecast", "--confidence", "50"]).is_err());
    }

    #[test]
    fn test_dimension_argument() {
        let cli = Cli::try_parse_from(["sales-forecast", "options", "--dimension", "product-line"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Options {
                dimension: Dimension::ProductLine,
                ..
            }
        ));
    }
}
