// ABOUTME: Status command implementation.
// ABOUTME: Lists processes per domain; unreachable domains fail the command.

use super::context::Context;
use fleetvisor::error::{Error, Result};

pub async fn status(ctx: Context, domains: &[String]) -> Result<()> {
    let domains = ctx.domains(domains)?;
    let outcomes = ctx.orchestrator().status(&domains).await;

    ctx.output
        .status(&outcomes, &ctx.config.process_state_store());

    let unreachable = outcomes.iter().filter(|o| o.result.is_err()).count();
    if unreachable > 0 {
        return Err(Error::OperationFailed {
            operation: "status".to_string(),
            failed: unreachable,
        });
    }
    Ok(())
}
