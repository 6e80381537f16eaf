//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Command, LoadArgs, ServeArgs};
pub use types::{PositiveU64, PositiveUsize};

pub(crate) use defaults::{
    DEFAULT_DASHBOARD_ID, DEFAULT_DASHBOARD_PARAM, DEFAULT_LISTEN, DEFAULT_SERVICE_NAME,
    DEFAULT_USER_AGENT, DEFAULT_VERSION,
};
