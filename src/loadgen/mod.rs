//! Replays a fixed sequence of API calls against a target host.
//!
//! Every virtual user logs in once, then loops over the same list of GET
//! requests. A checked request that answers with anything other than 200,
//! 202 or 204 aborts the whole run.
mod plan;
mod runner;
mod session;
mod summary;


pub use plan::{ACCEPTED_STATUSES, LoadPlan, RequestStep, iteration_steps};
pub use runner::run_load;
pub use session::{SESSION_COOKIE, login, session_cookie};
pub use summary::LoadSummary;
