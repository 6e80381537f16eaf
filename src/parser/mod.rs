//! Access-log line parsing.
//!
//! Application access-log lines carry their metrics at fixed token
//! positions, e.g.
//!
//! ```text
//! GET /api/card/5/query 200 452.1 ms (2 total hits) ... App DB connections: 3/10 ...
//! ```
//!
//! [`parse_log_line`] reads those positions into a [`MetricsRecord`]. The
//! parse is total: any token that is missing or not a number becomes an
//! absent field instead of an error.
mod numeric;
mod positions;
mod record;
pub mod trigger;


pub use positions::{Field, PositionTable, RuleContext, SHIFT_RULES, ShiftRule};
pub use record::{FieldValue, MetricsRecord, TaggedMetrics, unit_factor};
pub use trigger::should_parse;

use numeric::{parse_float, parse_int, strip_paren};

/// Substring of the message that marks an asynchronous request.
const ASYNC_MARKER: &str = "async";

/// Parses one access-log message into a metrics record.
///
/// Tokens are produced by splitting on single spaces, so repeated spaces
/// yield empty tokens that still occupy a position.
#[must_use]
pub fn parse_log_line(message: &str) -> MetricsRecord {
    let tokens: Vec<&str> = message.split(' ').collect();
    let token = |index: usize| tokens.get(index).copied();

    let verb = token(0).map(strip_verb_prefix).unwrap_or_default().to_owned();
    let endpoint = token(1);
    let code = parse_int(token(2)).filter(|code| *code != 0);

    let table = PositionTable::resolve(&RuleContext { code, endpoint });
    let at = |field: Field| token(table.index(field));
    let scalar = |field: Field| parse_int(at(field).map(strip_paren));

    let time = parse_float(at(Field::Time).map(strip_paren));
    let timeunit = at(Field::TimeUnit);
    let time_in_ms = time.and_then(|value| to_millis(value, timeunit));

    let (app_db_conns, total_app_db_conns) = read_pair(at(Field::AppDbConns));
    let (jetty_threads, total_jetty_threads) = read_pair(at(Field::JettyThreads));
    let (dw_db_connections, dw_db_total_conns) = read_pair(at(Field::DwDbConnections));

    MetricsRecord {
        verb,
        endpoint: endpoint.map(ToOwned::to_owned),
        is_async: message.contains(ASYNC_MARKER),
        code,
        time,
        timeunit: timeunit.map(ToOwned::to_owned),
        time_in_ms,
        app_db_calls: scalar(Field::AppDbCalls),
        app_db_conns,
        total_app_db_conns,
        jetty_threads,
        total_jetty_threads,
        jetty_idle: scalar(Field::JettyIdle),
        active_threads: scalar(Field::ActiveThreads),
        queries_in_flight: scalar(Field::QueriesInFlight),
        queued: scalar(Field::Queued),
        dw_id: read_dw_id(&table, token),
        dw_db_connections,
        dw_db_total_conns,
        threads_blocked: scalar(Field::ThreadsBlocked),
    }
}

/// Drops everything up to and including the first `m` when something
/// follows it; colourised lines start with an escape such as `\x1b[32mGET`.
fn strip_verb_prefix(token: &str) -> &str {
    token
        .split_once('m')
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(token)
}

/// Reads a `used/total` token; a missing token leaves both sides absent.
fn read_pair(token: Option<&str>) -> (Option<i64>, Option<i64>) {
    let Some(token) = token else {
        return (None, None);
    };
    let mut parts = token.split('/');
    (parse_int(parts.next()), parse_int(parts.next()))
}

fn read_dw_id<'msg>(
    table: &PositionTable,
    token: impl Fn(usize) -> Option<&'msg str>,
) -> Option<String> {
    let index = table.index(Field::DwId);
    let first = token(index).filter(|value| !value.is_empty())?;
    let second = token(index.saturating_add(2)).unwrap_or_default();
    Some(format!("{}_{}", first, second))
}

#[expect(
    clippy::float_arithmetic,
    reason = "time conversion is the only float math in the parser"
)]
fn to_millis(time: f64, unit: Option<&str>) -> Option<f64> {
    let millis = time * unit_factor(unit);
    millis.is_finite().then_some(millis)
}
