use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use kneadback_client::{QueueState, Submitter};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct SyncArgs {}

#[derive(Debug, Args)]
pub struct QueueArgs {}

#[derive(Debug, Serialize)]
struct QueueDto {
    path: String,
    #[serde(flatten)]
    state: QueueState,
}

pub fn sync(ctx: &Context<'_>, _args: SyncArgs) -> Result<()> {
    let report = Submitter::new(ctx.api, ctx.queue.clone()).sync()?;
    if ctx.json {
        return print_json(&report);
    }
    println!("succeeded: {}", report.succeeded);
    println!("failed: {}", report.failed);
    Ok(())
}

pub fn queue_status(ctx: &Context<'_>, _args: QueueArgs) -> Result<()> {
    let dto = QueueDto {
        path: ctx.queue.path().display().to_string(),
        state: ctx.queue.status()?,
    };
    if ctx.json {
        return print_json(&dto);
    }
    match dto.state {
        QueueState::Empty => println!("queue empty ({})", dto.path),
        QueueState::Pending { entries } => {
            println!("{entries} pending submission(s) in {}", dto.path)
        }
    }
    Ok(())
}
