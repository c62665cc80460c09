use anyhow::{Context as _, Result};
use clap::{Args, CommandFactory};
use clap_complete::{generate, generate_to, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
    /// Write the script into this directory instead of stdout
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

pub fn emit(args: CompletionsArgs) -> Result<()> {
    let mut cmd = crate::Cli::command();
    let bin = cmd.get_name().to_string();
    match args.dir {
        Some(dir) => {
            let written = generate_to(args.shell, &mut cmd, bin, &dir)
                .with_context(|| format!("write completions into {}", dir.display()))?;
            eprintln!("wrote {}", written.display());
        }
        None => generate(args.shell, &mut cmd, bin, &mut io::stdout().lock()),
    }
    Ok(())
}
