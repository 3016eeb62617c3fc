use std::error::Error as StdError;
use std::fmt;

/// Failure surface of a replay run.
///
/// Both kinds are fatal: the run stops at the first one and nothing is
/// retried or skipped.
#[derive(Debug)]
pub enum Error {
    /// The input could not be opened or a line could not be read.
    Io(std::io::Error),
    /// A row failed to parse or the engine rejected an event.
    ///
    /// `Display` shows the outermost context only; the remaining causes are
    /// reachable through `source()`.
    Processing(anyhow::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "input read error: {err}"),
            Error::Processing(err) => write!(f, "processing error: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Processing(err) => StdError::source(&**err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Processing(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn causes(err: &Error) -> Vec<String> {
        let mut out = vec![err.to_string()];
        let mut next = err.source();
        while let Some(cause) = next {
            out.push(cause.to_string());
            next = cause.source();
        }
        out
    }

    #[test]
    fn io_error_keeps_cause() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing.csv",
        ));
        assert!(err.to_string().starts_with("input read error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn processing_error_reports_each_cause_once() {
        let inner = anyhow::anyhow!("invalid side: HOLD")
            .context("parse backlog row")
            .context("batch 3");
        let err = Error::from(inner);
        assert_eq!(
            causes(&err),
            vec![
                "processing error: batch 3".to_string(),
                "parse backlog row".to_string(),
                "invalid side: HOLD".to_string(),
            ]
        );
    }
}
