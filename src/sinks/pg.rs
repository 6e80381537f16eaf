use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tokio::sync::oneshot;

use super::MetricsSink;
use super::config::PostgresSinkConfig;
use crate::error::{AppError, AppResult, SinkError};
use crate::parser::TaggedMetrics;

const WRITER_NAME: &str = "postgres";

pub(super) const DROP_METRICS_TABLE: &str = "DROP TABLE IF EXISTS metrics";

pub(super) const CREATE_METRICS_TABLE: &str = "CREATE TABLE IF NOT EXISTS metrics (
    id SERIAL PRIMARY KEY,
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
)";

// Numeric parameters are sent as INT8/FLOAT8 and narrowed by the server
// into the INTEGER/DECIMAL columns.
pub(super) const INSERT_METRICS: &str = "INSERT INTO metrics (
    source, version, verb, endpoint, is_async, code, time, timeunit, time_in_ms,
    app_db_calls, app_db_conns, total_app_db_conns, jetty_threads, total_jetty_threads,
    jetty_idle, active_threads, queries_in_flight, queued, dw_id, dw_db_connections,
    dw_db_total_conns, threads_blocked
) VALUES ($1, $2, $3, $4, $5, $6::INT8, $7::FLOAT8, $8, $9::FLOAT8, $10::INT8, $11::INT8,
    $12::INT8, $13::INT8, $14::INT8, $15::INT8, $16::INT8, $17::INT8, $18::INT8, $19,
    $20::INT8, $21::INT8, $22::INT8)";

/// Insert parameters in `INSERT_METRICS` placeholder order.
pub(super) fn insert_params(row: &TaggedMetrics) -> [&(dyn ToSql + Sync); 22] {
    let record = &row.record;
    [
        &row.source,
        &row.version,
        &record.verb,
        &record.endpoint,
        &record.is_async,
        &record.code,
        &record.time,
        &record.timeunit,
        &record.time_in_ms,
        &record.app_db_calls,
        &record.app_db_conns,
        &record.total_app_db_conns,
        &record.jetty_threads,
        &record.total_jetty_threads,
        &record.jetty_idle,
        &record.active_threads,
        &record.queries_in_flight,
        &record.queued,
        &record.dw_id,
        &record.dw_db_connections,
        &record.dw_db_total_conns,
        &record.threads_blocked,
    ]
}

type Job = Box<dyn FnOnce(&mut Client) + Send>;

/// PostgreSQL-backed `metrics` table.
///
/// The blocking client lives on its own thread and runs queued jobs in
/// order; it is closed when the sink is dropped.
#[derive(Debug)]
pub struct PostgresSink {
    jobs: mpsc::Sender<Job>,
}

impl PostgresSink {
    /// Connects, then makes sure the `metrics` table exists, dropping it
    /// first when `recreate_table` is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection or the schema setup fails.
    pub async fn connect(config: &PostgresSinkConfig) -> AppResult<Self> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let url = config.url.clone();
        let recreate = config.recreate_table;

        thread::Builder::new()
            .name("logrelay-postgres".to_owned())
            .spawn(move || match open_client(&url, recreate) {
                Ok(mut client) => {
                    drop(ready_tx.send(Ok(())));
                    for job in jobs_rx {
                        job(&mut client);
                    }
                }
                Err(err) => drop(ready_tx.send(Err(err))),
            })
            .map_err(|err| db_error("spawn postgres writer", err))?;

        ready_rx
            .await
            .map_err(|err| db_error("start postgres writer", err))?
            .map_err(|err| db_error("initialize postgres metrics table", err))?;

        if recreate {
            tracing::info!("Recreated metrics table in PostgreSQL");
        }
        Ok(Self { jobs: jobs_tx })
    }

    /// Inserts one row and returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error when the insert fails or the writer thread is gone.
    pub async fn insert(&self, metrics: &TaggedMetrics) -> AppResult<u64> {
        let row = metrics.clone();
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |client: &mut Client| {
            drop(reply_tx.send(client.execute(INSERT_METRICS, &insert_params(&row))));
        });
        self.jobs
            .send(job)
            .map_err(|err| {
                tracing::debug!("Postgres job rejected: {}", err);
                AppError::sink(SinkError::WriterStopped { name: WRITER_NAME })
            })?;

        reply_rx
            .await
            .map_err(|err| db_error("await postgres insert", err))?
            .map_err(|err| db_error("insert postgres metrics", err))
    }
}

fn open_client(url: &str, recreate: bool) -> Result<Client, postgres::Error> {
    let mut client = Client::connect(url, NoTls)?;
    if recreate {
        client.batch_execute(DROP_METRICS_TABLE)?;
    }
    client.batch_execute(CREATE_METRICS_TABLE)?;
    Ok(client)
}

#[async_trait]
impl MetricsSink for PostgresSink {
    fn name(&self) -> &'static str {
        WRITER_NAME
    }

    async fn write(&self, metrics: &TaggedMetrics) -> AppResult<()> {
        self.insert(metrics).await?;
        Ok(())
    }
}

fn db_error<E>(context: &'static str, err: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::sink(SinkError::Database {
        context,
        source: Box::new(err),
    })
}
