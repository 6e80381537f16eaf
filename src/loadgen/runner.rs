use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::COOKIE;
use url::Url;

use super::plan::{ACCEPTED_STATUSES, LoadPlan, RequestStep};
use super::session::{SESSION_COOKIE, login};
use super::summary::{LoadCounters, LoadSummary};
use crate::args::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult, LoadError};
use crate::system::shutdown::{ShutdownReceiver, ShutdownSender};

const GET: &str = "GET";

struct VuContext {
    client: Client,
    plan: LoadPlan,
    counters: LoadCounters,
}

/// Runs every virtual user to completion.
///
/// The run stops when each user has finished its iterations, when the
/// configured duration elapses, or when anything sends on `shutdown_tx`.
/// A failing user sends on `shutdown_tx` itself so the others stop too.
///
/// # Errors
///
/// Returns the first virtual-user failure, after every user has stopped.
pub async fn run_load(plan: LoadPlan, shutdown_tx: &ShutdownSender) -> AppResult<LoadSummary> {
    let client = Client::builder()
        .timeout(plan.request_timeout)
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .map_err(|err| AppError::load(LoadError::BuildClient { source: err }))?;

    tracing::info!(
        "Starting {} virtual user(s) against {}",
        plan.vus,
        plan.host
    );
    let duration = plan.duration;
    let vus = plan.vus;
    let ctx = Arc::new(VuContext {
        client,
        plan,
        counters: LoadCounters::default(),
    });
    let started = Instant::now();

    let mut handles = Vec::with_capacity(vus);
    for vu in 1..=vus {
        let ctx = Arc::clone(&ctx);
        let stop_rx = shutdown_tx.subscribe();
        let abort_tx = shutdown_tx.clone();
        handles.push(tokio::spawn(async move {
            let result = run_virtual_user(vu, &ctx, stop_rx).await;
            if result.is_err() {
                drop(abort_tx.send(()));
            }
            result
        }));
    }

    let timer = duration.map(|limit| spawn_duration_timer(limit, shutdown_tx));

    let mut first_error: Option<AppError> = None;
    for handle in handles {
        let outcome = match handle.await {
            Ok(result) => result,
            Err(err) => Err(AppError::load(LoadError::VirtualUser { source: err })),
        };
        if let Err(err) = outcome
            && first_error.is_none()
        {
            first_error = Some(err);
        }
    }
    if let Some(timer) = timer {
        timer.abort();
    }

    let summary = ctx.counters.summary(started.elapsed());
    tracing::info!("{}", summary.line());
    first_error.map_or(Ok(summary), Err)
}

fn spawn_duration_timer(
    limit: Duration,
    shutdown_tx: &ShutdownSender,
) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(limit).await;
        tracing::info!("Duration of {} ms elapsed, stopping", limit.as_millis());
        drop(shutdown_tx.send(()));
    })
}

async fn run_virtual_user(
    vu: usize,
    ctx: &VuContext,
    mut stop_rx: ShutdownReceiver,
) -> AppResult<()> {
    let mut session: Option<String> = None;
    let mut iteration: u64 = 0;

    loop {
        if let Some(limit) = ctx.plan.iterations
            && iteration >= limit
        {
            break;
        }
        tokio::select! {
            biased;
            _ = stop_rx.recv() => {
                tracing::debug!("VU {} stopping after {} iteration(s)", vu, iteration);
                break;
            }
            result = run_iteration(vu, iteration, ctx, &mut session) => {
                result?;
            }
        }
        ctx.counters.record_iteration();
        iteration = iteration.saturating_add(1);
    }
    Ok(())
}

async fn run_iteration(
    vu: usize,
    iteration: u64,
    ctx: &VuContext,
    session: &mut Option<String>,
) -> AppResult<()> {
    let cookie = match session.as_ref() {
        Some(cookie) => cookie.clone(),
        None => {
            ctx.counters.record_request();
            let cookie = login(&ctx.client, &ctx.plan).await.inspect_err(|_| {
                ctx.counters.record_failure();
            })?;
            *session = Some(cookie.clone());
            cookie
        }
    };
    let cookie_header = format!("{}={}", SESSION_COOKIE, cookie);

    tracing::debug!("VU {} ITER {} HOST {}", vu, iteration, ctx.plan.host);
    tokio::time::sleep(ctx.plan.think_time).await;

    for step in &ctx.plan.steps {
        let url = ctx.plan.url(&step.path)?;
        execute_step(ctx, step, url, &cookie_header).await?;
    }

    tokio::time::sleep(ctx.plan.think_time).await;
    Ok(())
}

async fn execute_step(
    ctx: &VuContext,
    step: &RequestStep,
    url: Url,
    cookie_header: &str,
) -> AppResult<()> {
    let started = Instant::now();
    ctx.counters.record_request();
    let sent = ctx
        .client
        .get(url.clone())
        .header(COOKIE, cookie_header)
        .send()
        .await;

    let response = match sent {
        Ok(response) => response,
        Err(err) => {
            ctx.counters.record_failure();
            if step.checked {
                return Err(AppError::load(LoadError::Request {
                    method: GET,
                    url: url.to_string(),
                    source: err,
                }));
            }
            tracing::warn!("{} {} failed: {}", GET, url, err);
            return Ok(());
        }
    };

    let status = response.status();
    if let Err(err) = drain_response_body(response).await {
        tracing::debug!("Failed to read body of {} {}: {}", GET, url, err);
    }
    if !step.checked {
        return Ok(());
    }

    if !ACCEPTED_STATUSES.contains(&status.as_u16()) {
        ctx.counters.record_failure();
        tracing::error!(
            "{} {} {} {}",
            GET,
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        return Err(AppError::load(LoadError::UnexpectedStatus {
            method: GET,
            url: url.to_string(),
            status: status.as_u16(),
        }));
    }

    ctx.counters.record_checked_ok();
    tracing::info!(
        "{} {} {} took {} ms total",
        GET,
        url,
        status.as_u16(),
        started.elapsed().as_millis()
    );
    Ok(())
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
