/// Fatal pipeline failures. Anything here aborts the run; the external
/// scheduler decides whether to retry on the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// An endpoint answered with a non-success HTTP status in a stage
    /// where that is not recoverable (symbol discovery).
    Transport { endpoint: String, status: u16 },
    /// The request never produced a response (connect failure, timeout).
    Http(String),
    /// Malformed JSON body or a non-empty, non-numeric quote field.
    Parse(String),
    /// DDL, insert, or commit failure against the destination table.
    Sink(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Transport { endpoint, status } => {
                write!(f, "transport: {endpoint} returned status {status}")
            }
            PipelineError::Http(msg) => write!(f, "http: {msg}"),
            PipelineError::Parse(msg) => write!(f, "parse: {msg}"),
            PipelineError::Sink(msg) => write!(f, "sink: {msg}"),
        }
    }
}

/// Why a single symbol was dropped from a fetch pass. Skips never abort
/// the run; they are aggregated and reported to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    HttpStatus(u16),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::HttpStatus(status) => write!(f, "http status {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineError, SkipReason};

    #[test]
    fn display_carries_endpoint_and_status() {
        let err = PipelineError::Transport {
            endpoint: "/exchangeInfo".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "transport: /exchangeInfo returned status 503");
        assert_eq!(SkipReason::HttpStatus(500).to_string(), "http status 500");
    }
}
