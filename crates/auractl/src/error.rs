//! Error types for auractl
//!
//! Defines structured error types using thiserror for better error handling and user experience.

use auractl_core::{ConfigError, CoreError, CredentialError};
use colored::Colorize;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: No credentials configured
///
///   tip: add one with your Aura API client id:
///       auractl credential add --name <name> --client-id <id>
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the auractl application
#[derive(Error, Debug)]
pub enum AuraCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential '{name}' not found")]
    CredentialNotFound { name: String },

    #[error("Credential '{name}' already exists")]
    CredentialExists { name: String },

    #[error("No credentials configured. Use 'auractl credential add' to add one.")]
    NoCredentialConfigured,

    #[error("No default credential set")]
    NoDefaultCredential { available: Vec<String> },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    ApiError { status: Option<u16>, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timed out waiting for {resource}; last status was '{status}'")]
    Timeout { resource: String, status: String },

    #[error("{resource} failed with status '{status}'{}", .detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
    OperationFailed {
        resource: String,
        status: String,
        detail: Option<String>,
    },

    #[error("{resource} reported an unrecognized status '{status}'")]
    UnexpectedStatus { resource: String, status: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for auractl operations
pub type Result<T> = std::result::Result<T, AuraCtlError>;

impl AuraCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            AuraCtlError::CredentialNotFound { name } => vec![
                "List available credentials: auractl credential list".to_string(),
                format!(
                    "Add credential '{}': auractl credential add --name {} --client-id <id>",
                    name, name
                ),
            ],
            AuraCtlError::NoCredentialConfigured => vec![
                "Create an API client in the Aura console under Account settings > API keys"
                    .to_string(),
                "Add it: auractl credential add --name <name> --client-id <id>".to_string(),
            ],
            AuraCtlError::NoDefaultCredential { available } => vec![
                format!("Pick a default: auractl credential use {}", available.join(" | ")),
                "Or pass --credential <name> for a single command".to_string(),
            ],
            AuraCtlError::AuthenticationFailed { .. } => vec![
                "Check the client id and secret: auractl credential list".to_string(),
                "Re-add the credential if the API client was rotated".to_string(),
                "Ensure the auth URL is correct: auractl config get auth-url".to_string(),
            ],
            AuraCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API URL is correct: auractl config get base-url".to_string(),
            ],
            AuraCtlError::ApiError {
                status: Some(404), ..
            } => vec![
                "Verify the resource ID is correct".to_string(),
                "List available resources to find the correct ID".to_string(),
                "Check that you're using the correct credential".to_string(),
            ],
            AuraCtlError::ApiError {
                status: Some(403), ..
            } => vec!["Check that the API client has access to this tenant".to_string()],
            AuraCtlError::Timeout { .. } => vec![
                "The operation may still complete; check again with the matching get command"
                    .to_string(),
                "Wait longer with --poll-interval or --poll-max-retries".to_string(),
            ],
            AuraCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: auractl <command> --help".to_string(),
            ],
            AuraCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let AuraCtlError::NoDefaultCredential { available } = self {
            diag = diag.detail(&format!("Configured credentials: {}", available.join(", ")));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for AuraCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth(message) => AuraCtlError::AuthenticationFailed { message },
            CoreError::Api { status, .. } => AuraCtlError::ApiError {
                status: Some(status),
                message: err.to_string(),
            },
            CoreError::Transport { .. } | CoreError::HttpClient(_) => {
                AuraCtlError::ConnectionError {
                    message: err.to_string(),
                }
            }
            CoreError::UnexpectedResponse { .. } => AuraCtlError::ApiError {
                status: None,
                message: err.to_string(),
            },
            CoreError::Serialize(e) => AuraCtlError::InvalidInput {
                message: e.to_string(),
            },
            CoreError::Credentials(e) => AuraCtlError::from(e),
            CoreError::Config(e) => AuraCtlError::from(e),
        }
    }
}

impl From<CredentialError> for AuraCtlError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NotFound { name } => AuraCtlError::CredentialNotFound { name },
            CredentialError::AlreadyExists { name } => AuraCtlError::CredentialExists { name },
            CredentialError::NoneConfigured => AuraCtlError::NoCredentialConfigured,
            CredentialError::NoDefault { available } => {
                AuraCtlError::NoDefaultCredential { available }
            }
            other => AuraCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<ConfigError> for AuraCtlError {
    fn from(err: ConfigError) -> Self {
        AuraCtlError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for AuraCtlError {
    fn from(err: serde_json::Error) -> Self {
        AuraCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for AuraCtlError {
    fn from(err: std::io::Error) -> Self {
        AuraCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for AuraCtlError {
    fn from(err: anyhow::Error) -> Self {
        AuraCtlError::InvalidInput {
            message: format!("{:#}", err),
        }
    }
}
