use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid assignment, expected NAME=VALUE: {0}")]
    InvalidAssignment(String),
    #[error("Invalid source reference: {0}")]
    InvalidSource(String),
    #[error("Source not found: {0}")]
    SourceNotFound(String),
    #[error("Failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Variables in {0} must be a JSON object")]
    VariablesNotObject(String),
    #[error("{service} request failed: {message}")]
    Remote { service: &'static str, message: String },
    #[error("Parameters missing from SSM response: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
    #[error("No remote backend configured for {0}")]
    RemoteUnavailable(String),
    #[error("Undefined variable(s) in template: {0}")]
    UndefinedVariable(String),
    #[error("Failed to render template")]
    Template(#[from] minijinja::Error),
}

impl Error {
    pub fn remote(service: &'static str, message: impl ToString) -> Self {
        Error::Remote {
            service,
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
