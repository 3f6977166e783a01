use std::fs::File;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use hmilink_dispatch::{HandlerRegistry, IngestExit, IngestTask};
use hmilink_frame::FrameReader;
use tracing::{info, warn};

use crate::cmd::printer::FramePrinter;
use crate::cmd::ReplayArgs;
use crate::exit::{
    frame_error, io_error, registry_error, CliError, CliResult, DATA_INVALID, INTERNAL, SUCCESS,
};
use crate::link::LinkOpts;
use crate::output::{print_snapshot, OutputFormat};

/// Feed a capture through the same reader, registry and ingest loop used on
/// a live link.
pub fn run(args: ReplayArgs, format: OutputFormat, opts: &LinkOpts) -> CliResult<i32> {
    let mut config = opts.frame_config()?;
    if let Some(chunk_size) = args.chunk_size {
        config.read_chunk_size = chunk_size;
    }

    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    let reader = FrameReader::with_config(file, config.clone())
        .map_err(|err| frame_error("invalid replay settings", err))?;

    let registry = Arc::new(HandlerRegistry::with_config(opts.registry_config()));
    let printer = Arc::new(FramePrinter::new(format, None, None));
    registry
        .register(printer.clone())
        .map_err(|err| registry_error("register failed", err))?;

    let stop = AtomicBool::new(false);
    let report = IngestTask::new(reader, registry).run(&stop);
    info!(
        frames = report.frames,
        overflows = report.overflows,
        chunk_size = config.read_chunk_size,
        "replay finished"
    );

    if args.snapshot {
        print_snapshot(&printer.snapshot(), format);
    }

    match report.exit {
        IngestExit::Io(reason) => {
            return Err(CliError::new(INTERNAL, format!("replay failed: {reason}")))
        }
        IngestExit::RegistryPoisoned => {
            return Err(CliError::new(INTERNAL, "registry lock poisoned"))
        }
        IngestExit::Stopped | IngestExit::Closed => {}
    }

    if report.overflows > 0 {
        warn!(
            overflows = report.overflows,
            capacity = config.buffer_capacity,
            "messages dropped by buffer overflow"
        );
        if args.fail_on_overflow {
            return Err(CliError::new(
                DATA_INVALID,
                format!(
                    "{} message(s) exceeded the {}-byte buffer",
                    report.overflows, config.buffer_capacity
                ),
            ));
        }
    }

    Ok(SUCCESS)
}
