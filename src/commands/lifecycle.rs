// ABOUTME: Stop, start, and restart command implementations.
// ABOUTME: Resolve domains, run the workflow, and print the aggregate report.

use super::context::Context;
use fleetvisor::error::{Error, Result};
use fleetvisor::types::Color;
use std::time::Duration;

pub async fn stop(
    mut ctx: Context,
    domains: &[String],
    processes: Option<Vec<String>>,
    wait: bool,
    force_kill_timeout: Option<Duration>,
) -> Result<()> {
    let domains = ctx.domains(domains)?;
    ctx.output.start_timer();
    ctx.output
        .progress(&format!("Stopping processes in {} domain(s)", domains.len()));

    let report = ctx
        .orchestrator()
        .stop(&domains, processes, wait, force_kill_timeout)
        .await;
    ctx.finish(&report)
}

pub async fn start(
    mut ctx: Context,
    domains: &[String],
    processes: Option<Vec<String>>,
    state: Option<&str>,
) -> Result<()> {
    let state = state
        .map(|s| parse_state(&ctx, s))
        .transpose()?;
    let domains = ctx.domains(domains)?;
    ctx.output.start_timer();
    ctx.output
        .progress(&format!("Starting processes in {} domain(s)", domains.len()));

    let report = ctx.orchestrator().start(&domains, processes, state).await;
    ctx.finish(&report)
}

pub async fn restart(
    mut ctx: Context,
    domains: &[String],
    wait: bool,
    wait_workers: bool,
    force_kill_timeout: Option<Duration>,
) -> Result<()> {
    let domains = ctx.domains(domains)?;
    ctx.output.start_timer();
    let mode = if wait_workers {
        "stop-all then start"
    } else {
        "rolling"
    };
    ctx.output.progress(&format!(
        "Restarting {} domain(s) ({mode})",
        domains.len()
    ));

    let report = ctx
        .orchestrator()
        .restart(&domains, wait, wait_workers, force_kill_timeout)
        .await;
    ctx.finish(&report)
}

/// `--state` must name one of the configured colors.
fn parse_state(ctx: &Context, value: &str) -> Result<Color> {
    let colors = &ctx.config.rolling.colors;
    let color = Color::new(&value.to_lowercase())
        .map_err(|e| Error::InvalidConfig(format!("invalid --state: {e}")))?;
    if !colors.contains(&color) {
        return Err(Error::InvalidConfig(format!(
            "invalid --state '{value}': must be one of {colors}"
        )));
    }
    Ok(color)
}
