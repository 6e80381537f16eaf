mod args;
mod config;
mod entry;
mod error;
mod ingest;
mod loadgen;
mod parser;
mod sinks;
mod system;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
