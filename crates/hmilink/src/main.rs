mod cmd;
mod exit;
mod link;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::link::LinkOpts;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "hmilink", version, about = "Panel serial link CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    link: LinkOpts,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format, &cli.link);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hmilink_message::Command as LinkCommand;

    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from(["hmilink", "send", "/dev/ttyS1", "get-settings"])
            .expect("send args should parse");

        match cli.command {
            Command::Send(args) => assert_eq!(args.command, Some(LinkCommand::GetSettings)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_command_with_raw() {
        let err = Cli::try_parse_from([
            "hmilink",
            "send",
            "/dev/ttyS1",
            "start",
            "--raw",
            "STA*",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_unknown_command_name() {
        assert!(Cli::try_parse_from(["hmilink", "send", "/dev/ttyS1", "launch"]).is_err());
    }

    #[test]
    fn global_link_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hmilink",
            "replay",
            "capture.bin",
            "--buffer-capacity",
            "64",
            "--read-timeout",
            "250ms",
            "--slots",
            "3",
        ])
        .expect("replay args should parse");

        assert!(matches!(cli.command, Command::Replay(_)));
        assert_eq!(cli.link.buffer_capacity, 64);
        assert_eq!(cli.link.read_timeout, Duration::from_millis(250));
        assert_eq!(cli.link.slots, 3);
    }

    #[test]
    fn parses_listen_filters() {
        let cli = Cli::try_parse_from([
            "hmilink",
            "listen",
            "/tmp/panel.sock",
            "--unix",
            "--kinds",
            "DATA,SETTINGS",
            "--count",
            "5",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert!(args.unix);
                assert_eq!(args.count, Some(5));
                assert_eq!(
                    args.kinds,
                    Some(vec!["DATA".to_string(), "SETTINGS".to_string()])
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
