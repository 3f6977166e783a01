use std::path::Path;
use std::time::Duration;

use clap::Args;
use hmilink_dispatch::{RegistryConfig, DEFAULT_SLOT_COUNT};
use hmilink_frame::{
    FrameConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_DELIMITER, DEFAULT_READ_CHUNK_SIZE,
};
use hmilink_transport::LinkStream;
use tracing::debug;

use crate::exit::{frame_error, transport_error, CliResult};

/// Link settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct LinkOpts {
    /// Accumulation buffer capacity in bytes.
    #[arg(
        long,
        global = true,
        env = "HMILINK_BUFFER_CAPACITY",
        default_value_t = DEFAULT_BUFFER_CAPACITY
    )]
    pub buffer_capacity: usize,

    /// Bytes requested from the link per read.
    #[arg(
        long,
        global = true,
        env = "HMILINK_READ_CHUNK",
        default_value_t = DEFAULT_READ_CHUNK_SIZE
    )]
    pub read_chunk: usize,

    /// Link read timeout (e.g. 1s, 250ms).
    #[arg(
        long,
        global = true,
        env = "HMILINK_READ_TIMEOUT",
        default_value = "1000ms",
        value_parser = parse_duration
    )]
    pub read_timeout: Duration,

    /// Number of consumer slots.
    #[arg(
        long,
        global = true,
        env = "HMILINK_SLOTS",
        default_value_t = DEFAULT_SLOT_COUNT
    )]
    pub slots: usize,
}

impl LinkOpts {
    pub fn frame_config(&self) -> CliResult<FrameConfig> {
        let config = FrameConfig {
            buffer_capacity: self.buffer_capacity,
            read_chunk_size: self.read_chunk,
            delimiter: DEFAULT_DELIMITER,
            read_timeout: Some(self.read_timeout),
            write_timeout: Some(self.read_timeout),
        };
        config
            .validate()
            .map_err(|err| frame_error("invalid link settings", err))?;
        Ok(config)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig { slots: self.slots }
    }
}

/// Open a serial device node, or connect to a simulated link socket.
pub fn open_link(path: &Path, unix: bool) -> CliResult<LinkStream> {
    let link = if unix {
        LinkStream::connect_unix(path).map_err(|err| transport_error("connect failed", err))?
    } else {
        LinkStream::open_device(path).map_err(|err| transport_error("open failed", err))?
    };
    debug!(path = %path.display(), kind = link.kind().as_str(), "link opened");
    Ok(link)
}

/// Parse `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn zero_capacity_is_a_usage_error() {
        let opts = LinkOpts {
            buffer_capacity: 0,
            read_chunk: 128,
            read_timeout: Duration::from_secs(1),
            slots: 10,
        };
        let err = opts.frame_config().unwrap_err();
        assert_eq!(err.code, crate::exit::USAGE);
    }
}
