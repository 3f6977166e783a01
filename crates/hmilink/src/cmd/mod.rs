use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hmilink_message::Command as LinkCommand;

use crate::exit::{CliError, CliResult, INTERNAL};
use crate::link::{parse_duration, LinkOpts};
use crate::output::OutputFormat;

pub mod listen;
pub mod printer;
pub mod replay;
pub mod send;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the link and print every frame received.
    Listen(ListenArgs),
    /// Write one command token to the link.
    Send(SendArgs),
    /// Run a captured byte stream through the frame assembler.
    Replay(ReplayArgs),
    /// Act as the controller on a Unix socket, streaming a capture file.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, link: &LinkOpts) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format, link),
        Command::Send(args) => send::run(args, format, link),
        Command::Replay(args) => replay::run(args, format, link),
        Command::Simulate(args) => simulate::run(args, link),
        Command::Version(args) => version::run(args),
    }
}

/// Clear `running` on Ctrl-C.
pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device node, or socket path with --unix.
    pub path: PathBuf,
    /// Treat PATH as a simulated link socket.
    #[arg(long)]
    pub unix: bool,
    /// Do not send the echo-off initialisation string.
    #[arg(long)]
    pub no_init: bool,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print messages of these kinds (comma-separated, e.g. DATA,SETTINGS).
    #[arg(long, value_delimiter = ',')]
    pub kinds: Option<Vec<String>>,
    /// Print the latest value of every field on exit.
    #[arg(long)]
    pub snapshot: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial device node, or socket path with --unix.
    pub path: PathBuf,
    /// Command to send: start, stop, reset, reset-counters, get-settings, disable-echo.
    #[arg(required_unless_present = "raw", conflicts_with = "raw")]
    pub command: Option<LinkCommand>,
    /// Send this text verbatim instead of a named command.
    #[arg(long)]
    pub raw: Option<String>,
    /// Treat PATH as a simulated link socket.
    #[arg(long)]
    pub unix: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Captured link bytes.
    pub file: PathBuf,
    /// Bytes fed per read (default: --read-chunk).
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Exit with status 60 if any message overflowed the buffer.
    #[arg(long)]
    pub fail_on_overflow: bool,
    /// Print the latest value of every field at the end.
    #[arg(long)]
    pub snapshot: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Bytes to stream to the panel.
    #[arg(long)]
    pub file: PathBuf,
    /// Pause between chunks (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub interval: Duration,
    /// Bytes written per chunk (default: one line at a time).
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Stream the file again after reaching its end.
    #[arg(long)]
    pub repeat: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
