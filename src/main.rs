use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use stlview::inspect::snapshot::Snapshot;
use stlview::{logging, Viewer, ViewerConfig};

#[derive(Parser)]
#[command(
    name = "stlview",
    about = "Inspect C++ standard library containers in a process snapshot",
    version
)]
struct Cli {
    /// Snapshot of the paused process (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Viewer configuration (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Arguments of one `v` command; commands are read from stdin when empty
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_tracing_json();
    } else {
        logging::init_tracing();
    }

    let config = match &cli.config {
        Some(path) => ViewerConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    let snapshot = Snapshot::from_path(&cli.snapshot)
        .with_context(|| format!("loading snapshot {}", cli.snapshot.display()))?;
    let viewer = Viewer::new(&config);
    info!(snapshot = %cli.snapshot.display(), "Ready");

    if !cli.command.is_empty() {
        let line = cli
            .command
            .iter()
            .map(|a| quote_arg(a))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", viewer.invoke(&snapshot, &line));
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading command")?;
        let line = line.trim();
        let args = line.strip_prefix("v ").unwrap_or(line).trim();
        match args {
            "" => continue,
            "quit" | "q" => break,
            "help" => writeln!(stdout, "{}", Viewer::USAGE)?,
            _ => writeln!(stdout, "{}", viewer.invoke(&snapshot, args))?,
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Re-quote an argument the shell already split so the command tokenizer
/// sees it as one token.
fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\') {
        return arg.to_string();
    }
    let mut out = String::from("\"");
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
