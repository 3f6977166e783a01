use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hmilink_frame::{CommandWriter, FrameError};
use hmilink_transport::{LinkListener, LinkStream};
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, SimulateArgs};
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::link::LinkOpts;

const COMMAND_POLL: Duration = Duration::from_millis(100);

pub fn run(args: SimulateArgs, opts: &LinkOpts) -> CliResult<i32> {
    let config = opts.frame_config()?;
    let data = std::fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    let chunks = split_chunks(&data, args.chunk_size)?;

    let listener =
        LinkListener::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    info!(path = %listener.path().display(), "waiting for panel");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let link = listener
        .accept()
        .map_err(|err| transport_error("accept failed", err))?;
    info!("panel connected");

    let rx_link = link
        .try_clone()
        .map_err(|err| transport_error("link clone failed", err))?;
    rx_link
        .set_read_timeout(Some(COMMAND_POLL))
        .map_err(|err| transport_error("link setup failed", err))?;
    let done = Arc::new(AtomicBool::new(false));
    let rx_done = Arc::clone(&done);
    let rx_thread = thread::Builder::new()
        .name("hmilink-sim-rx".to_string())
        .spawn(move || log_commands(rx_link, &rx_done))
        .map_err(|err| io_error("failed to start command reader", err))?;

    let mut writer = CommandWriter::with_config_link(link, &config)
        .map_err(|err| frame_error("link setup failed", err))?;
    let streamed = stream(&mut writer, &chunks, &args, &running);

    done.store(true, Ordering::Release);
    let _ = rx_thread.join();
    drop(writer);

    let sent = streamed?;
    info!(chunks = sent, "simulation finished");
    Ok(SUCCESS)
}

fn stream(
    writer: &mut CommandWriter<LinkStream>,
    chunks: &[&[u8]],
    args: &SimulateArgs,
    running: &AtomicBool,
) -> CliResult<u64> {
    let mut sent = 0u64;
    loop {
        for chunk in chunks {
            if !running.load(Ordering::SeqCst) {
                return Ok(sent);
            }
            match writer.send(chunk) {
                Ok(()) => sent += 1,
                Err(err) if is_disconnect(&err) => {
                    info!("panel disconnected");
                    return Ok(sent);
                }
                Err(err) => return Err(frame_error("write failed", err)),
            }
            thread::sleep(args.interval);
        }
        if !args.repeat {
            return Ok(sent);
        }
    }
}

/// Log everything the panel sends back until `done` is set.
fn log_commands(mut link: LinkStream, done: &AtomicBool) {
    let mut buf = [0u8; 128];
    while !done.load(Ordering::Acquire) {
        match link.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => info!(
                command = %String::from_utf8_lossy(&buf[..n]).escape_debug(),
                "panel sent"
            ),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) => {}
            Err(err) => {
                debug!(error = %err, "command reader stopped");
                break;
            }
        }
    }
}

fn split_chunks(data: &[u8], chunk_size: Option<usize>) -> CliResult<Vec<&[u8]>> {
    match chunk_size {
        Some(0) => Err(CliError::new(USAGE, "--chunk-size must be greater than zero")),
        Some(size) => Ok(data.chunks(size).collect()),
        None => Ok(data.split_inclusive(|byte| *byte == b'\n').collect()),
    }
}

fn is_disconnect(err: &FrameError) -> bool {
    match err {
        FrameError::ConnectionClosed => true,
        FrameError::Io(io) => matches!(
            io.kind(),
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::NotConnected
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_by_line_by_default() {
        let chunks = split_chunks(b"DATA:T1=1;\nPARAM_OK\ntail", None).unwrap();
        assert_eq!(
            chunks,
            [&b"DATA:T1=1;\n"[..], &b"PARAM_OK\n"[..], &b"tail"[..]]
        );
    }

    #[test]
    fn splits_by_size() {
        let chunks = split_chunks(b"abcdefg", Some(3)).unwrap();
        assert_eq!(chunks, [&b"abc"[..], &b"def"[..], &b"g"[..]]);
        assert_eq!(split_chunks(b"x", Some(0)).unwrap_err().code, USAGE);
    }

    #[test]
    fn broken_pipe_is_a_disconnect() {
        assert!(is_disconnect(&FrameError::ConnectionClosed));
        assert!(is_disconnect(&FrameError::Io(std::io::Error::from(
            ErrorKind::BrokenPipe
        ))));
        assert!(!is_disconnect(&FrameError::InvalidConfig("x".into())));
    }
}
