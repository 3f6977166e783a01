use hmilink_frame::CommandWriter;
use serde::Serialize;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::link::{open_link, LinkOpts};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct SendOutput<'a> {
    command: Option<&'a str>,
    token: String,
    bytes: usize,
}

pub fn run(args: SendArgs, format: OutputFormat, opts: &LinkOpts) -> CliResult<i32> {
    let token = resolve_token(&args)?;
    let config = opts.frame_config()?;
    let link = open_link(&args.path, args.unix)?;
    let mut writer = CommandWriter::with_config_link(link, &config)
        .map_err(|err| frame_error("link setup failed", err))?;

    writer
        .send(&token)
        .map_err(|err| frame_error("send failed", err))?;

    let out = SendOutput {
        command: args.command.map(|cmd| cmd.name()),
        token: String::from_utf8_lossy(&token).escape_debug().to_string(),
        bytes: token.len(),
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent {} ({} bytes)", out.token, out.bytes)
        }
        OutputFormat::Raw => {}
    }

    Ok(SUCCESS)
}

fn resolve_token(args: &SendArgs) -> CliResult<Vec<u8>> {
    match (&args.command, &args.raw) {
        (Some(command), _) => Ok(command.as_bytes().to_vec()),
        (None, Some(raw)) if !raw.is_empty() => Ok(raw.as_bytes().to_vec()),
        _ => Err(CliError::new(USAGE, "nothing to send")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use hmilink_message::Command as LinkCommand;

    use super::*;

    fn args(command: Option<LinkCommand>, raw: Option<&str>) -> SendArgs {
        SendArgs {
            path: PathBuf::from("/dev/null"),
            command,
            raw: raw.map(str::to_string),
            unix: false,
        }
    }

    #[test]
    fn named_command_resolves_to_token() {
        let token = resolve_token(&args(Some(LinkCommand::ResetCounters), None)).unwrap();
        assert_eq!(token, b"RSC*");
    }

    #[test]
    fn raw_text_is_sent_verbatim() {
        let token = resolve_token(&args(None, Some("PARAM;SP=40*"))).unwrap();
        assert_eq!(token, b"PARAM;SP=40*");
    }

    #[test]
    fn empty_request_is_usage_error() {
        assert_eq!(resolve_token(&args(None, Some(""))).unwrap_err().code, USAGE);
        assert_eq!(resolve_token(&args(None, None)).unwrap_err().code, USAGE);
    }
}
