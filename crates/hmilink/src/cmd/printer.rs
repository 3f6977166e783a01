use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use hmilink_dispatch::FrameConsumer;
use hmilink_frame::Frame;
use hmilink_message::{Message, Snapshot};
use tracing::debug;

use crate::output::{print_frame, OutputFormat};

/// Consumer that prints frames and keeps a field snapshot.
pub struct FramePrinter {
    format: OutputFormat,
    kinds: Option<Vec<String>>,
    limit: Option<usize>,
    printed: AtomicUsize,
    snapshot: Mutex<Snapshot>,
}

impl FramePrinter {
    pub fn new(format: OutputFormat, kinds: Option<Vec<String>>, limit: Option<usize>) -> Self {
        Self {
            format,
            kinds,
            limit,
            printed: AtomicUsize::new(0),
            snapshot: Mutex::new(Snapshot::new()),
        }
    }

    /// Frames printed so far.
    pub fn printed(&self) -> usize {
        self.printed.load(Ordering::Acquire)
    }

    /// Whether the frame limit has been reached.
    pub fn is_done(&self) -> bool {
        self.limit.is_some_and(|limit| self.printed() >= limit)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .lock()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_default()
    }

    fn wants(&self, message: Option<&Message>) -> bool {
        let Some(kinds) = &self.kinds else {
            return true;
        };
        message.is_some_and(|m| {
            kinds
                .iter()
                .any(|kind| kind.eq_ignore_ascii_case(m.kind().as_str()))
        })
    }
}

impl FrameConsumer for FramePrinter {
    fn on_frame(&self, frame: &Frame) {
        if self.is_done() {
            return;
        }

        let message = match Message::from_frame(frame) {
            Ok(message) => Some(message),
            Err(err) => {
                debug!(error = %err, "frame is not a controller message");
                None
            }
        };
        if !self.wants(message.as_ref()) {
            return;
        }

        if let (Some(message), Ok(mut snapshot)) = (&message, self.snapshot.lock()) {
            snapshot.apply(message);
        }
        print_frame(frame, message.as_ref(), self.format);
        self.printed.fetch_add(1, Ordering::AcqRel);
    }

    fn name(&self) -> &str {
        "cli-printer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_filter_is_case_insensitive() {
        let printer = FramePrinter::new(OutputFormat::Raw, Some(vec!["data".into()]), None);
        let data = Message::parse("DATA:T1=1").unwrap();
        let settings = Message::parse("SETTINGS:SP=4").unwrap();

        assert!(printer.wants(Some(&data)));
        assert!(!printer.wants(Some(&settings)));
        assert!(!printer.wants(None));
    }

    #[test]
    fn stops_at_limit_and_keeps_snapshot() {
        let printer = FramePrinter::new(OutputFormat::Raw, None, Some(2));
        printer.on_frame(&Frame::from("DATA:T1=1;"));
        printer.on_frame(&Frame::from("DATA:T1=2;"));
        printer.on_frame(&Frame::from("DATA:T1=3;"));

        assert_eq!(printer.printed(), 2);
        assert!(printer.is_done());
        let snapshot = printer.snapshot();
        assert_eq!(
            snapshot.get(&hmilink_message::MessageKind::Data, "T1"),
            Some("2")
        );
    }
}
