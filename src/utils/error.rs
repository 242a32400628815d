use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Artifact '{artifact}' not found (module {module}, contract {future_id})")]
    ArtifactNotFoundError {
        module: String,
        future_id: String,
        artifact: String,
    },

    #[error("Constructor arguments for '{artifact}' do not match (module {module}, contract {future_id}): {reason}")]
    ConstructorArgumentMismatchError {
        module: String,
        future_id: String,
        artifact: String,
        reason: String,
    },

    #[error("Parameter '{name}' of module {module} has no value and no default")]
    MissingParameterError { module: String, name: String },

    #[error("Reference to '{future_id}' has not been deployed yet")]
    UnresolvedReferenceError { future_id: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Deployment task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Execution,
    System,
}

impl DeployError {
    pub fn configuration(message: impl Into<String>) -> Self {
        DeployError::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DeployError::ConfigurationError { .. }
            | DeployError::InvalidConfigValueError { .. }
            | DeployError::MissingConfigError { .. }
            | DeployError::MissingParameterError { .. }
            | DeployError::TomlError(_) => ErrorCategory::Configuration,
            DeployError::ArtifactNotFoundError { .. }
            | DeployError::ConstructorArgumentMismatchError { .. }
            | DeployError::UnresolvedReferenceError { .. } => ErrorCategory::Execution,
            DeployError::IoError(_)
            | DeployError::SerializationError(_)
            | DeployError::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DeployError::ConfigurationError { .. } => {
                "Check module names are non-empty and unique, and that exports only reference contracts of the module"
            }
            DeployError::InvalidConfigValueError { .. } | DeployError::MissingConfigError { .. } => {
                "Fix the reported field in the project file or command line"
            }
            DeployError::ArtifactNotFoundError { .. } => {
                "Compile the contract and make sure its artifact JSON is in the artifacts directory"
            }
            DeployError::ConstructorArgumentMismatchError { .. } => {
                "Compare the module's constructor arguments with the contract's constructor signature"
            }
            DeployError::MissingParameterError { .. } => {
                "Provide the parameter in the parameters file or give it a default"
            }
            DeployError::UnresolvedReferenceError { .. } => {
                "Deploy the module that owns the referenced contract first"
            }
            DeployError::TomlError(_) => "Make sure the project file is valid TOML",
            DeployError::IoError(_) => "Check file paths and permissions",
            DeployError::SerializationError(_) => {
                "The journal or parameters file is not valid JSON; fix or remove it"
            }
            DeployError::TaskError(_) => "Re-run the deployment; completed contracts are resumed",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Execution => 1,
            ErrorCategory::System => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
