use std::fmt;
use std::io::Write;
use std::str::FromStr;

use hmilink_frame::CommandWriter;

use crate::error::MessageError;

/// Outbound command tokens understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Stop,
    Reset,
    ResetCounters,
    GetSettings,
    /// Link initialisation: turn off the controller's echo.
    DisableEcho,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Start,
        Command::Stop,
        Command::Reset,
        Command::ResetCounters,
        Command::GetSettings,
        Command::DisableEcho,
    ];

    /// Exact bytes written to the link.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Command::Start => b"STA*",
            Command::Stop => b"STO*",
            Command::Reset => b"RES*",
            Command::ResetCounters => b"RSC*",
            Command::GetSettings => b"GET_SETTINGS*",
            Command::DisableEcho => b"ATE0\r\n",
        }
    }

    /// Name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Reset => "reset",
            Command::ResetCounters => "reset-counters",
            Command::GetSettings => "get-settings",
            Command::DisableEcho => "disable-echo",
        }
    }

    /// Write this command through a command writer.
    pub fn send_to<T: Write>(self, writer: &mut CommandWriter<T>) -> hmilink_frame::Result<()> {
        writer.send(self.as_bytes())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Command::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| MessageError::UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_match_controller_protocol() {
        assert_eq!(Command::Start.as_bytes(), b"STA*");
        assert_eq!(Command::Stop.as_bytes(), b"STO*");
        assert_eq!(Command::Reset.as_bytes(), b"RES*");
        assert_eq!(Command::ResetCounters.as_bytes(), b"RSC*");
        assert_eq!(Command::GetSettings.as_bytes(), b"GET_SETTINGS*");
        assert_eq!(Command::DisableEcho.as_bytes(), b"ATE0\r\n");
    }

    #[test]
    fn names_parse_back() {
        for cmd in Command::ALL {
            assert_eq!(cmd.name().parse::<Command>().unwrap(), cmd);
        }
        assert_eq!("GET_SETTINGS".parse::<Command>().unwrap(), Command::GetSettings);
        assert_eq!(
            "launch".parse::<Command>(),
            Err(MessageError::UnknownCommand("launch".to_string()))
        );
    }

    #[test]
    fn send_to_writes_raw_token() {
        let mut writer = CommandWriter::new(Vec::new());
        Command::DisableEcho.send_to(&mut writer).unwrap();
        Command::Start.send_to(&mut writer).unwrap();
        assert_eq!(writer.into_inner(), b"ATE0\r\nSTA*");
    }
}
