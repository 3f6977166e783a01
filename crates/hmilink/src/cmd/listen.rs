use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hmilink_dispatch::{HandlerRegistry, IngestExit, IngestTask};
use hmilink_frame::{CommandWriter, FrameReader};
use hmilink_message::Command as LinkCommand;
use tracing::info;

use crate::cmd::printer::FramePrinter;
use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{
    dispatch_error, frame_error, registry_error, transport_error, CliError, CliResult, INTERNAL,
    SUCCESS, TRANSPORT_ERROR,
};
use crate::link::{open_link, LinkOpts};
use crate::output::{print_snapshot, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: ListenArgs, format: OutputFormat, opts: &LinkOpts) -> CliResult<i32> {
    let config = opts.frame_config()?;
    let link = open_link(&args.path, args.unix)?;

    if !args.no_init {
        let init_link = link
            .try_clone()
            .map_err(|err| transport_error("link clone failed", err))?;
        let mut writer = CommandWriter::with_config_link(init_link, &config)
            .map_err(|err| frame_error("link init failed", err))?;
        LinkCommand::DisableEcho
            .send_to(&mut writer)
            .map_err(|err| frame_error("link init failed", err))?;
    }

    let reader = FrameReader::with_config_link(link, config)
        .map_err(|err| frame_error("link setup failed", err))?;
    let registry = HandlerRegistry::shared(opts.registry_config());
    let printer = Arc::new(FramePrinter::new(format, args.kinds, args.count));
    registry
        .register(printer.clone())
        .map_err(|err| registry_error("register failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let handle = IngestTask::new(reader, Arc::clone(&registry))
        .spawn()
        .map_err(|err| dispatch_error("ingest failed", err))?;

    while running.load(Ordering::SeqCst) && !printer.is_done() && !handle.is_finished() {
        std::thread::sleep(POLL_INTERVAL);
    }

    let report = handle
        .stop()
        .map_err(|err| dispatch_error("ingest failed", err))?;
    info!(
        frames = report.frames,
        printed = printer.printed(),
        overflows = report.overflows,
        "listen finished"
    );

    if args.snapshot {
        print_snapshot(&printer.snapshot(), format);
    }

    match report.exit {
        IngestExit::Io(reason) => Err(CliError::new(
            TRANSPORT_ERROR,
            format!("link failed: {reason}"),
        )),
        IngestExit::RegistryPoisoned => Err(CliError::new(INTERNAL, "registry lock poisoned")),
        IngestExit::Stopped | IngestExit::Closed => Ok(SUCCESS),
    }
}

