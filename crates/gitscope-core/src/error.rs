use std::fmt;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidQuery(message.into()))
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderUnavailable(message.into()))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InvalidQuery(msg) => write!(f, "invalid query: {msg}"),
            ErrorKind::ProviderUnavailable(msg) => write!(f, "provider unavailable: {msg}"),
            kind => write!(f, "{kind:?}"),
        }
    }
}

impl std::error::Error for Error {}

#[derive(Debug)]
pub enum ErrorKind {
    Io(std::io::ErrorKind),
    NotARepository,
    /// Malformed search predicate. Rejected before any session exists;
    /// distinct from a search that simply matched nothing.
    InvalidQuery(String),
    /// Transient provider failure. Never merged into accumulated results
    /// and never presented as end-of-history.
    ProviderUnavailable(String),
    Unsupported(&'static str),
    Backend(String),
}
