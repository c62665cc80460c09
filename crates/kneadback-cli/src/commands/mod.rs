use anyhow::Result;
use kneadback_client::{ApiClient, OfflineQueue};
use serde::Serialize;
use std::io::{self, Write};

pub mod completions;
pub mod query;
pub mod submit;
pub mod sync;

pub struct Context<'a> {
    pub api: &'a ApiClient,
    pub queue: &'a OfflineQueue,
    pub json: bool,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
