// ABOUTME: Graceful restart command implementation.
// ABOUTME: Maps CLI flags onto the workflow options and prints the report.

use super::context::Context;
use fleetvisor::error::Result;
use fleetvisor::orchestrator::GracefulRestartOptions;

pub async fn graceful_restart(
    mut ctx: Context,
    domains: &[String],
    opts: GracefulRestartOptions,
) -> Result<()> {
    let domains = ctx.domains(domains)?;
    ctx.output.start_timer();
    ctx.output.progress(&format!(
        "Graceful restart of {} domain(s){}{}",
        domains.len(),
        if opts.suspend || opts.wait_jobs {
            ", suspending job admission"
        } else {
            ""
        },
        if opts.pause_upstream {
            ", pausing upstream"
        } else {
            ""
        },
    ));

    let report = ctx.orchestrator().graceful_restart(&domains, opts).await?;
    ctx.finish(&report)
}
