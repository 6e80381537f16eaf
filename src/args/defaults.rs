pub(crate) const DEFAULT_USER_AGENT: &str = concat!("logrelay/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_LISTEN: &str = "0.0.0.0:3000";
/// `service_name` label attached to every forwarded log stream.
pub(crate) const DEFAULT_SERVICE_NAME: &str = "metabase";
/// Version tag used when none is configured.
pub(crate) const DEFAULT_VERSION: &str = "vUNKNOWN";

pub(crate) const DEFAULT_DASHBOARD_ID: u64 = 8;
pub(crate) const DEFAULT_DASHBOARD_PARAM: &str = "1817812382";
