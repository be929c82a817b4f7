use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, SeqScoutError>;

#[derive(Debug)]
pub enum SeqScoutError {
    Message(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    HttpStatus {
        url: String,
        status: u16,
        snippet: String,
    },
    Parse(String),
}

impl Error for SeqScoutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for SeqScoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Csv(e) => write!(f, "CSV error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Http(e) => write!(f, "request failed: {e}"),
            Self::HttpStatus {
                url,
                status,
                snippet,
            } => write!(f, "HTTP {status} from '{url}': {snippet}"),
            Self::Parse(msg) => write!(f, "could not parse response: {msg}"),
        }
    }
}

impl From<String> for SeqScoutError {
    fn from(err: String) -> Self {
        SeqScoutError::Message(err)
    }
}

impl From<&str> for SeqScoutError {
    fn from(err: &str) -> Self {
        SeqScoutError::Message(err.to_string())
    }
}

impl From<std::io::Error> for SeqScoutError {
    fn from(err: std::io::Error) -> Self {
        SeqScoutError::Io(err)
    }
}

impl From<csv::Error> for SeqScoutError {
    fn from(err: csv::Error) -> Self {
        SeqScoutError::Csv(err)
    }
}

impl From<serde_json::Error> for SeqScoutError {
    fn from(err: serde_json::Error) -> Self {
        SeqScoutError::Json(err)
    }
}

impl From<reqwest::Error> for SeqScoutError {
    fn from(err: reqwest::Error) -> Self {
        SeqScoutError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_render_url_and_snippet() {
        let err = SeqScoutError::HttpStatus {
            url: "https://example.org/efetch.fcgi".to_string(),
            status: 400,
            snippet: "Bad Request".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 400 from 'https://example.org/efetch.fcgi': Bad Request"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: SeqScoutError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(err.to_string().contains("read-only"));
        assert!(err.source().is_some());
        assert!(matches!(err, SeqScoutError::Io(_)));
    }
}
