use async_trait::async_trait;
use tokio_rusqlite::Connection;

use super::MetricsSink;
use super::config::DbSinkConfig;
use crate::error::{AppError, AppResult, SinkError};
use crate::parser::TaggedMetrics;

const CREATE_METRICS_TABLE: &str = "CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    source VARCHAR(100),
    version VARCHAR(50),
    verb VARCHAR(7),
    endpoint TEXT,
    is_async BOOLEAN,
    async_completed VARCHAR(8),
    code INTEGER,
    time DECIMAL(10,2),
    timeunit TEXT,
    time_in_ms DECIMAL(10,2),
    app_db_calls INTEGER,
    app_db_conns INTEGER,
    total_app_db_conns INTEGER,
    jetty_threads INTEGER,
    total_jetty_threads INTEGER,
    jetty_idle INTEGER,
    active_threads INTEGER,
    queries_in_flight INTEGER,
    queued INTEGER,
    dw_id VARCHAR(255),
    dw_db_connections INTEGER,
    dw_db_total_conns INTEGER,
    threads_blocked INTEGER
);";

const INSERT_METRICS: &str = "INSERT INTO metrics (
    source, version, verb, endpoint, is_async, code, time, timeunit, time_in_ms,
    app_db_calls, app_db_conns, total_app_db_conns, jetty_threads, total_jetty_threads,
    jetty_idle, active_threads, queries_in_flight, queued, dw_id, dw_db_connections,
    dw_db_total_conns, threads_blocked
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)";

/// SQLite-backed `metrics` table.
///
/// `async_completed` and `ts` are never written by the relay; `ts` falls
/// back to the insert time.
#[derive(Debug, Clone)]
pub struct MetricsDb {
    conn: Connection,
}

impl MetricsDb {
    /// Opens the database and makes sure the `metrics` table exists,
    /// dropping it first when `recreate_table` is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be opened or the schema
    /// cannot be created.
    pub async fn open(config: &DbSinkConfig) -> AppResult<Self> {
        let conn = Connection::open(config.path.as_str())
            .await
            .map_err(|err| db_error("open sqlite metrics db", err))?;

        let recreate = config.recreate_table;
        conn.call(move |conn| {
            if recreate {
                conn.execute_batch("DROP TABLE IF EXISTS metrics;")?;
            }
            conn.execute_batch(CREATE_METRICS_TABLE)?;
            Ok(())
        })
        .await
        .map_err(|err| db_error("initialize sqlite metrics table", err))?;

        if recreate {
            tracing::info!("Recreated metrics table in {}", config.path);
        }
        Ok(Self { conn })
    }

    /// Inserts one row and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error when the insert fails.
    pub async fn insert(&self, metrics: &TaggedMetrics) -> AppResult<i64> {
        let row = metrics.clone();
        self.conn
            .call(move |conn| {
                let record = &row.record;
                conn.execute(
                    INSERT_METRICS,
                    rusqlite::params![
                        row.source,
                        row.version,
                        record.verb,
                        record.endpoint,
                        record.is_async,
                        record.code,
                        record.time,
                        record.timeunit,
                        record.time_in_ms,
                        record.app_db_calls,
                        record.app_db_conns,
                        record.total_app_db_conns,
                        record.jetty_threads,
                        record.total_jetty_threads,
                        record.jetty_idle,
                        record.active_threads,
                        record.queries_in_flight,
                        record.queued,
                        record.dw_id,
                        record.dw_db_connections,
                        record.dw_db_total_conns,
                        record.threads_blocked
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|err| db_error("insert sqlite metrics", err))
    }
}

#[async_trait]
impl MetricsSink for MetricsDb {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn write(&self, metrics: &TaggedMetrics) -> AppResult<()> {
        let id = self.insert(metrics).await?;
        tracing::debug!("Inserted metrics row {}", id);
        Ok(())
    }
}

fn db_error(context: &'static str, err: tokio_rusqlite::Error) -> AppError {
    AppError::sink(SinkError::Database {
        context,
        source: Box::new(err),
    })
}
