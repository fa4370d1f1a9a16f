use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error while {context}: {source}")]
    Csv {
        context: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("log header mismatch: expected `{expected}`, found `{found}`")]
    SchemaMismatch { expected: String, found: String },
    #[error("text {index} is {length} characters long, maximum is {max}")]
    TextTooLong {
        index: usize,
        length: usize,
        max: usize,
    },
    #[error("record has {found} fields but the schema has {expected} columns")]
    RecordWidth { expected: usize, found: usize },
    #[error("cannot parse session value `{value}` in last log row")]
    MalformedSession { value: String },
    #[error("failed to send marker {code}: {source}")]
    Marker {
        code: u8,
        #[source]
        source: std::io::Error,
    },
    #[error("key input closed before the block finished")]
    InputClosed,
}

pub type Result<T> = std::result::Result<T, ExperimentError>;

impl ExperimentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn csv(context: &'static str, source: csv::Error) -> Self {
        Self::Csv { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
