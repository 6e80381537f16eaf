use serde::Serialize;

/// Metrics extracted from one access-log line.
///
/// Every numeric field is either a parsed number or `None`; a token that
/// could not be read never turns into a zero or a NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub verb: String,
    pub endpoint: Option<String>,
    pub is_async: bool,
    pub code: Option<i64>,
    pub time: Option<f64>,
    pub timeunit: Option<String>,
    pub time_in_ms: Option<f64>,
    pub app_db_calls: Option<i64>,
    pub app_db_conns: Option<i64>,
    pub total_app_db_conns: Option<i64>,
    pub jetty_threads: Option<i64>,
    pub total_jetty_threads: Option<i64>,
    pub jetty_idle: Option<i64>,
    pub active_threads: Option<i64>,
    pub queries_in_flight: Option<i64>,
    pub queued: Option<i64>,
    pub dw_id: Option<String>,
    pub dw_db_connections: Option<i64>,
    pub dw_db_total_conns: Option<i64>,
    pub threads_blocked: Option<i64>,
}

/// A single present field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'rec> {
    Int(i64),
    Float(f64),
    Str(&'rec str),
    Bool(bool),
}

impl MetricsRecord {
    /// Present fields in column order; absent fields are skipped.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        let ints =
            |name: &'static str, value: Option<i64>| value.map(|v| (name, FieldValue::Int(v)));
        let floats =
            |name: &'static str, value: Option<f64>| value.map(|v| (name, FieldValue::Float(v)));

        [
            Some(("verb", FieldValue::Str(self.verb.as_str()))),
            self.endpoint.as_deref().map(|v| ("endpoint", FieldValue::Str(v))),
            Some(("is_async", FieldValue::Bool(self.is_async))),
            ints("code", self.code),
            floats("time", self.time),
            self.timeunit.as_deref().map(|v| ("timeunit", FieldValue::Str(v))),
            floats("time_in_ms", self.time_in_ms),
            ints("app_db_calls", self.app_db_calls),
            ints("app_db_conns", self.app_db_conns),
            ints("total_app_db_conns", self.total_app_db_conns),
            ints("jetty_threads", self.jetty_threads),
            ints("total_jetty_threads", self.total_jetty_threads),
            ints("jetty_idle", self.jetty_idle),
            ints("active_threads", self.active_threads),
            ints("queries_in_flight", self.queries_in_flight),
            ints("queued", self.queued),
            self.dw_id.as_deref().map(|v| ("dw_id", FieldValue::Str(v))),
            ints("dw_db_connections", self.dw_db_connections),
            ints("dw_db_total_conns", self.dw_db_total_conns),
            ints("threads_blocked", self.threads_blocked),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// A metrics record together with the tags the sinks index it by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedMetrics {
    pub version: String,
    pub source: String,
    #[serde(flatten)]
    pub record: MetricsRecord,
}

/// Multiplier that converts a duration in `unit` to milliseconds.
///
/// Unknown or missing units are treated as milliseconds.
#[must_use]
pub fn unit_factor(unit: Option<&str>) -> f64 {
    match unit {
        Some("µs") => 0.001,
        Some("s") => 1000.0,
        Some("m") => 60000.0,
        Some(_) | None => 1.0,
    }
}
