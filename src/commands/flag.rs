// ABOUTME: Suspend and resume commands for the job suspension flag.
// ABOUTME: Lets an operator clear a flag left behind by an interrupted run.

use super::context::Context;
use fleetvisor::error::{Error, Result};

pub async fn suspend(ctx: Context) -> Result<()> {
    let orchestrator = ctx.orchestrator();
    if orchestrator.suspend().await? {
        ctx.output.success("Job admission suspended");
        Ok(())
    } else {
        Err(Error::OperationFailed {
            operation: "suspend".to_string(),
            failed: 1,
        })
    }
}

pub async fn resume(ctx: Context) -> Result<()> {
    if ctx.orchestrator().resume().await? {
        ctx.output.success("Job admission resumed");
    } else {
        ctx.output.success("Job admission was not suspended");
    }
    Ok(())
}
