use std::fmt;
use std::str::FromStr;

use hmilink_frame::Frame;
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::config::ParseConfig;
use crate::error::{MessageError, Result};

/// The kind tag at the start of a controller message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    /// `DATA:` telemetry snapshot.
    Data,
    /// `SETTINGS:` configuration snapshot.
    Settings,
    /// `PARAM...` acknowledgement.
    Param,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl MessageKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "DATA" => MessageKind::Data,
            "SETTINGS" => MessageKind::Settings,
            t if t.starts_with("PARAM") => MessageKind::Param,
            other => MessageKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Data => "DATA",
            MessageKind::Settings => "SETTINGS",
            MessageKind::Param => "PARAM",
            MessageKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A parsed controller message: kind tag plus ordered `key=value` fields.
///
/// The tag ends at the first `:`. Tags without a colon (`PARAM_OK`,
/// `PARAM;SP=40;`) end at the first field separator instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    kind: MessageKind,
    tag: String,
    fields: Vec<(String, String)>,
}

impl Message {
    /// Parse message text with the default, lenient configuration.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ParseConfig::default())
    }

    /// Parse message text.
    pub fn parse_with(text: &str, config: &ParseConfig) -> Result<Self> {
        let text = text.trim_end_matches('\r');
        let (tag, body) = match text.split_once(':') {
            Some((tag, body)) => (tag, body),
            None => text
                .split_once(config.field_separator)
                .unwrap_or((text, "")),
        };
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(MessageError::MissingKind);
        }

        let mut fields = Vec::new();
        for segment in body.split(config.field_separator) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    fields.push((key.trim().to_string(), value.trim().to_string()));
                }
                _ if config.strict_fields => {
                    return Err(MessageError::MalformedField(segment.to_string()));
                }
                _ => trace!(segment, "skipping malformed field"),
            }
        }

        Ok(Self {
            kind: MessageKind::from_tag(tag),
            tag: tag.to_string(),
            fields,
        })
    }

    /// Parse the content of a frame.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        Self::parse(frame.as_str()?)
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The tag exactly as received (e.g. `PARAM_OK`).
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Fields in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields, duplicates included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the message carried no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value of a field. The last occurrence wins when a key repeats.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse a field value into any `FromStr` type.
    pub fn parse_field<T: FromStr>(&self, key: &str) -> Result<T> {
        let value = self.require(key)?;
        value.parse().map_err(|_| MessageError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Parse a status bitmask given in decimal or `0x` hexadecimal.
    pub fn bitmask(&self, key: &str) -> Result<u32> {
        let value = self.require(key)?;
        let parsed = match value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => value.parse(),
        };
        parsed.map_err(|_| MessageError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.field(key)
            .ok_or_else(|| MessageError::MissingField(key.to_string()))
    }
}
