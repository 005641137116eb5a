//! Pooled access to the sales database

use crate::config::{ConnectorOptions, DatabaseSettings, Driver};
use crate::error::{PipelineError, Result};
use futures_util::future::BoxFuture;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool, Row};
use tracing::{debug, info};

/// Handle to a lazily connecting pool
///
/// Cloning is cheap and shares the underlying pool.
#[derive(Debug, Clone)]
pub struct Connector {
    pool: AnyPool,
    driver: Driver,
    options: ConnectorOptions,
}

impl Connector {
    /// Build a pool from resolved settings without opening a connection.
    pub fn connect_lazy(settings: &DatabaseSettings, options: &ConnectorOptions) -> Result<Self> {
        Self::from_url(&settings.connection_url(), options)
    }

    /// Build a pool from a sqlx connection URL.
    pub fn from_url(url: &str, options: &ConnectorOptions) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let driver = Driver::from_url(url)?;

        let pool = AnyPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_lazy(url)
            .map_err(|e| PipelineError::Connection(e.to_string()))?;

        debug!(?driver, max_connections = options.max_connections, "Created connection pool");

        Ok(Self {
            pool,
            driver,
            options: options.clone(),
        })
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn options(&self) -> &ConnectorOptions {
        &self.options
    }

    /// Run `body` on one pooled connection.
    ///
    /// The connection goes back to the pool on every exit path. A body
    /// running past the query timeout is abandoned with a `Timeout` error.
    pub async fn with_connection<T, F>(&self, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut AnyConnection) -> BoxFuture<'c, Result<T>>,
    {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| PipelineError::Connection(e.to_string()))?;
        debug!("Acquired database connection");

        let limit = self.options.query_timeout;
        let outcome = tokio::time::timeout(limit, body(&mut *conn)).await;

        drop(conn);
        debug!("Released database connection");

        match outcome {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                operation: "database query",
                limit,
            }),
        }
    }

    /// Check connectivity by asking the server for its version.
    pub async fn validate(&self) -> Result<String> {
        let sql = self.driver.version_query();
        let version = self
            .with_connection(|conn| {
                Box::pin(async move {
                    let row = sqlx::query(sql).fetch_one(conn).await?;
                    let version: String = row.try_get(0)?;
                    Ok(version)
                })
            })
            .await?;

        info!(%version, "Database connection validated");
        Ok(version)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Closed connection pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn memory() -> Connector {
        Connector::from_url("sqlite::memory:", &ConnectorOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn test_validate_returns_version() {
        let connector = memory();
        let version = connector.validate().await.unwrap();
        assert!(version.starts_with('3'));
    }

    #[tokio::test]
    async fn test_slow_body_times_out() {
        let options = ConnectorOptions {
            query_timeout: Duration::from_millis(20),
            ..ConnectorOptions::default()
        };
        let connector = Connector::from_url("sqlite::memory:", &options).unwrap();

        let result: Result<()> = connector
            .with_connection(|_conn| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(())
                })
            })
            .await;

        assert!(matches!(result, Err(PipelineError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_connection_is_released_after_error() {
        let options = ConnectorOptions {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(2),
            ..ConnectorOptions::default()
        };
        let connector = Connector::from_url("sqlite::memory:", &options).unwrap();

        let failed: Result<()> = connector
            .with_connection(|_conn| {
                Box::pin(async move { Err(PipelineError::Query("boom".to_string())) })
            })
            .await;
        assert!(failed.is_err());

        // A single-connection pool would time out here if the first one leaked
        assert!(connector.validate().await.is_ok());
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let result = Connector::from_url("mysql://localhost/db", &ConnectorOptions::default());
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }
}
