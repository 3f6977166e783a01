//! Two screens sharing one link: a live data view and a settings view.
//!
//! Run with:
//!   cargo run --example panel-screens
//!
//! The controller traffic is canned and arrives in awkward chunks, including
//! one message too long for the buffer.

use std::io::Read;
use std::sync::{Arc, Mutex};

use hmilink::dispatch::{FrameConsumer, HandlerRegistry, IngestTask, RegistryConfig};
use hmilink::frame::{Frame, FrameConfig, FrameReader};
use hmilink::message::{Message, MessageKind, Snapshot};

const WIRE: &[u8] = b"DATA:T1=21.5;T2=19.0;VOL=120;ERR=0x00;\n\
SETTINGS:SP=40;HYST=2;\n\
DATA:T1=21.7;NOTE=this-message-is-far-too-long-for-a-64-byte-buffer-and-is-dropped;\n\
DATA:T1=21.9;ERR=0x04;\n\
PARAM_OK\n";

/// Shows one kind of message, keeping the last value of each field.
struct Screen {
    title: &'static str,
    kind: MessageKind,
    values: Mutex<Snapshot>,
}

impl FrameConsumer for Screen {
    fn on_frame(&self, frame: &Frame) {
        let Ok(message) = Message::from_frame(frame) else {
            return;
        };
        if message.kind() != &self.kind {
            return;
        }
        if let Ok(mut values) = self.values.lock() {
            values.apply(&message);
        }
    }

    fn name(&self) -> &str {
        self.title
    }
}

/// Hands out the canned traffic seven bytes at a time.
struct Trickle {
    data: &'static [u8],
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.data.len().min(buf.len()).min(7);
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = HandlerRegistry::shared(RegistryConfig { slots: 4 });

    let data = Arc::new(Screen {
        title: "data",
        kind: MessageKind::Data,
        values: Mutex::new(Snapshot::new()),
    });
    let settings = Arc::new(Screen {
        title: "settings",
        kind: MessageKind::Settings,
        values: Mutex::new(Snapshot::new()),
    });
    registry.register(data.clone())?;
    let settings_id = registry.register(settings.clone())?;

    let config = FrameConfig {
        buffer_capacity: 64,
        ..FrameConfig::default()
    };
    let reader = FrameReader::with_config(Trickle { data: WIRE }, config)?;
    let report = IngestTask::new(reader, Arc::clone(&registry))
        .spawn()?
        .join()?;

    registry.unregister(settings_id)?;

    eprintln!(
        "frames={} overflows={} exit={:?}",
        report.frames, report.overflows, report.exit
    );
    for screen in [&data, &settings] {
        let values = screen.values.lock().map_err(|_| "screen lock poisoned")?;
        for (_, key, value) in values.entries() {
            println!("{}: {key} = {value}", screen.title);
        }
    }

    Ok(())
}
