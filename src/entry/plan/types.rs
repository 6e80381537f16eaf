use std::time::Duration;

use crate::loadgen::LoadPlan;
use crate::sinks::SinksConfig;

pub(in crate::entry) struct ServePlan {
    pub(super) listen: String,
    pub(super) sinks: SinksConfig,
    pub(super) version: String,
    pub(super) source: Option<String>,
    pub(super) read_timeout: Duration,
}

pub(in crate::entry) enum RunPlan {
    Serve(ServePlan),
    Load(LoadPlan),
}
