/// Controls how strictly message fields are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// When true, a field segment without `=` fails the whole message.
    /// When false it is skipped.
    pub strict_fields: bool,
    /// Field separator inside the message body.
    pub field_separator: char,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            strict_fields: false,
            field_separator: ';',
        }
    }
}
