//! Token positions of the metrics fields.
//!
//! The base layout is fixed; [`SHIFT_RULES`] move fields further right when
//! a line carries extra tokens. Rules are applied in declaration order and
//! their deltas add up.

/// HTTP status of an accepted-for-processing response; such lines carry two
/// extra tokens before the metrics.
const ACCEPTED_CODE: i64 = 202;
/// Endpoints containing this marker log two extra tokens before the
/// warehouse connection counts.
const TILES_MARKER: &str = "tiles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Time,
    TimeUnit,
    AppDbCalls,
    AppDbConns,
    TotalAppDbConns,
    JettyThreads,
    TotalJettyThreads,
    JettyIdle,
    ActiveThreads,
    QueriesInFlight,
    Queued,
    DwId,
    DwDbConnections,
    DwDbTotalConns,
    ThreadsBlocked,
}

impl Field {
    pub const ALL: [Self; 15] = [
        Self::Time,
        Self::TimeUnit,
        Self::AppDbCalls,
        Self::AppDbConns,
        Self::TotalAppDbConns,
        Self::JettyThreads,
        Self::TotalJettyThreads,
        Self::JettyIdle,
        Self::ActiveThreads,
        Self::QueriesInFlight,
        Self::Queued,
        Self::DwId,
        Self::DwDbConnections,
        Self::DwDbTotalConns,
        Self::ThreadsBlocked,
    ];

    /// Token index in an unshifted line.
    #[must_use]
    pub const fn base_index(self) -> usize {
        match self {
            Self::Time => 3,
            Self::TimeUnit => 4,
            Self::AppDbCalls => 5,
            Self::AppDbConns | Self::TotalAppDbConns => 11,
            Self::JettyThreads | Self::TotalJettyThreads => 14,
            Self::JettyIdle => 15,
            Self::ActiveThreads => 19,
            Self::QueriesInFlight => 26,
            Self::Queued => 27,
            Self::DwId => 29,
            Self::DwDbConnections => 31,
            Self::DwDbTotalConns => 33,
            Self::ThreadsBlocked => 34,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::TimeUnit => "timeunit",
            Self::AppDbCalls => "app_db_calls",
            Self::AppDbConns => "app_db_conns",
            Self::TotalAppDbConns => "total_app_db_conns",
            Self::JettyThreads => "jetty_threads",
            Self::TotalJettyThreads => "total_jetty_threads",
            Self::JettyIdle => "jetty_idle",
            Self::ActiveThreads => "active_threads",
            Self::QueriesInFlight => "queries_in_flight",
            Self::Queued => "queued",
            Self::DwId => "dw_id",
            Self::DwDbConnections => "dw_db_connections",
            Self::DwDbTotalConns => "dw_db_total_conns",
            Self::ThreadsBlocked => "threads_blocked",
        }
    }
}

/// Values a shift rule may look at, taken from the first tokens of a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext<'msg> {
    pub code: Option<i64>,
    pub endpoint: Option<&'msg str>,
}

/// Moves `fields` right by `delta` tokens when `applies` holds.
#[derive(Debug)]
pub struct ShiftRule {
    pub name: &'static str,
    pub applies: fn(&RuleContext<'_>) -> bool,
    /// `None` shifts every field.
    pub fields: Option<&'static [Field]>,
    pub delta: usize,
}

impl ShiftRule {
    #[must_use]
    pub fn moves(&self, field: Field) -> bool {
        self.fields.is_none_or(|fields| fields.contains(&field))
    }
}

pub static SHIFT_RULES: [ShiftRule; 2] = [
    ShiftRule {
        name: "accepted-response",
        applies: is_accepted_response,
        fields: None,
        delta: 2,
    },
    // Only the used/total token's own index moves; `dw_db_total_conns` is
    // read from that same token, so its table entry is left alone.
    ShiftRule {
        name: "tiles-endpoint",
        applies: is_tiles_endpoint,
        fields: Some(&[Field::DwDbConnections]),
        delta: 2,
    },
];

fn is_accepted_response(ctx: &RuleContext<'_>) -> bool {
    ctx.code == Some(ACCEPTED_CODE)
}

fn is_tiles_endpoint(ctx: &RuleContext<'_>) -> bool {
    ctx.endpoint
        .is_some_and(|endpoint| endpoint.contains(TILES_MARKER))
}

/// Field positions for one line: the base layout plus the rules that fired.
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    active: Vec<&'static ShiftRule>,
}

impl PositionTable {
    #[must_use]
    pub const fn base() -> Self {
        Self { active: Vec::new() }
    }

    #[must_use]
    pub fn resolve(ctx: &RuleContext<'_>) -> Self {
        Self {
            active: SHIFT_RULES.iter().filter(|rule| (rule.applies)(ctx)).collect(),
        }
    }

    #[must_use]
    pub fn index(&self, field: Field) -> usize {
        self.active
            .iter()
            .filter(|rule| rule.moves(field))
            .fold(field.base_index(), |index, rule| {
                index.saturating_add(rule.delta)
            })
    }

    /// Names of the rules that fired, in application order.
    pub fn applied(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.active.iter().map(|rule| rule.name)
    }
}
