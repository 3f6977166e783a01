/// Errors that can occur while interpreting frame content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    /// The frame is not valid UTF-8 text.
    #[error("frame is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    /// The frame has no kind tag.
    #[error("message has no kind tag")]
    MissingKind,

    /// A field segment is not `key=value`.
    #[error("malformed field: {0:?}")]
    MalformedField(String),

    /// A requested field is absent.
    #[error("field {0} not present")]
    MissingField(String),

    /// A field value does not parse as the requested type.
    #[error("field {key} has invalid value {value:?}")]
    InvalidValue { key: String, value: String },

    /// A command name is not known.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

pub type Result<T> = std::result::Result<T, MessageError>;
