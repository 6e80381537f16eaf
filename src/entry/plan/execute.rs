use std::sync::Arc;

use crate::error::AppResult;
use crate::ingest::{self, IngestState};
use crate::loadgen::run_load;
use crate::sinks::Sinks;
use crate::system::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

use super::types::{RunPlan, ServePlan};

pub(crate) async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::Serve(plan) => run_serve(plan).await,
        RunPlan::Load(plan) => {
            let (shutdown_tx, _) = shutdown_channel();
            let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
            let result = run_load(plan, &shutdown_tx).await;
            drop(shutdown_tx.send(()));
            drop(signal_handle.await);
            result.map(|_| ())
        }
    }
}

async fn run_serve(plan: ServePlan) -> AppResult<()> {
    let sinks = Sinks::connect(&plan.sinks).await?;
    if sinks.loki.is_none() && !sinks.wants_metrics() {
        tracing::warn!("No sinks configured; payloads will be accepted and dropped");
    } else {
        tracing::info!("Configured sinks: {:?}", sinks);
    }

    let listener = ingest::bind(&plan.listen).await?;
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let state = Arc::new(IngestState {
        sinks,
        version: plan.version,
        source: plan.source,
        read_timeout: plan.read_timeout,
    });
    ingest::serve(listener, state, shutdown_rx).await;

    drop(signal_handle.await);
    Ok(())
}
