use thiserror::Error;

#[derive(Error, Debug)]
pub enum JanitorError {
    #[error("Failed to parse listing {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("Malformed record at entry {index}: missing {field}")]
    MalformedRecord { index: usize, field: String },

    #[error("External command failed for {identifier}: {message}")]
    ExternalCall { identifier: String, message: String },

    #[error("Network request failed for {url}: {message}")]
    Network { url: String, message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for JanitorError {
    fn user_message(&self) -> String {
        match self {
            JanitorError::Parse { source_name, message } => {
                format!("Could not read listing {}: {}", source_name, message)
            }
            JanitorError::MalformedRecord { index, field } => {
                format!("Listing entry #{} is missing the '{}' field", index, field)
            }
            JanitorError::ExternalCall { identifier, message } => {
                format!("Deletion of {} failed: {}", identifier, message)
            }
            JanitorError::Network { url, message } => {
                format!("Could not fetch {}: {}", url, message)
            }
            JanitorError::InvalidUrl { url } => {
                format!("Invalid URL: {}", url)
            }
            JanitorError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            JanitorError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            JanitorError::Parse { .. } => Some(
                "Check the listing encoding with --encoding (listings redirected from PowerShell are usually utf-16).".to_string()
            ),
            JanitorError::MalformedRecord { .. } => Some(
                "Regenerate the listing with --format=json so every entry carries createTime, package and version.".to_string()
            ),
            JanitorError::ExternalCall { .. } => Some(
                "Make sure the deletion program is installed, on PATH and authenticated, or rerun with --dry-run to inspect the plan.".to_string()
            ),
            JanitorError::Network { .. } => Some(
                "Check your internet connection and that the site is reachable, or raise the timeout in [verify].".to_string()
            ),
            JanitorError::InvalidUrl { .. } => Some(
                "Provide an absolute http:// or https:// URL (e.g., https://example.com).".to_string()
            ),
            JanitorError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<url::ParseError> for JanitorError {
    fn from(error: url::ParseError) -> Self {
        JanitorError::InvalidUrl {
            url: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for JanitorError {
    fn from(error: toml::de::Error) -> Self {
        JanitorError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JanitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = JanitorError::MalformedRecord {
            index: 3,
            field: "createTime".to_string(),
        };
        assert!(error.user_message().contains("#3"));
        assert!(error.user_message().contains("createTime"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_cancelled_has_no_suggestion() {
        assert!(JanitorError::Cancelled.suggestion().is_none());
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let error = JanitorError::from(toml_error);
        assert!(matches!(error, JanitorError::Config { .. }));
    }

    #[test]
    fn test_url_error_conversion() {
        let parse_error = url::Url::parse("not a url").unwrap_err();
        let error = JanitorError::from(parse_error);
        assert!(matches!(error, JanitorError::InvalidUrl { .. }));
    }
}
