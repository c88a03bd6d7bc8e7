use thiserror::Error;

pub type Result<T> = std::result::Result<T, BeanError>;

#[derive(Debug, Error)]
pub enum BeanError {
    #[error("Bean scan failed: {message}")]
    ScanFailure { message: String },

    #[error("Bean {bean_name} already exists for {type_name}")]
    DuplicateBeanName {
        bean_name: String,
        type_name: String,
    },

    #[error("Invalid bean definition for {type_name}: {message}")]
    InvalidDefinition { type_name: String, message: String },

    #[error("Could not autowire. No concrete class found for {type_name}")]
    NoCandidate { type_name: String },

    #[error("Could not autowire {type_name}: more than one candidate found [{candidates}]")]
    AmbiguousCandidate {
        type_name: String,
        candidates: String,
    },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("No such bean: {type_name}")]
    BeanNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("{bean_name} did not declare a dependency on {type_name}")]
    UndeclaredDependency {
        bean_name: String,
        type_name: String,
    },

    #[error("Failed to construct bean {bean_name}: {message}")]
    ConstructionFailed { bean_name: String, message: String },
}

impl BeanError {
    pub fn scan_failure(message: impl Into<String>) -> Self {
        Self::ScanFailure {
            message: message.into(),
        }
    }

    pub fn invalid_definition(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn construction_failed(bean_name: impl Into<String>, message: impl ToString) -> Self {
        Self::ConstructionFailed {
            bean_name: bean_name.into(),
            message: message.to_string(),
        }
    }

    /// True for the failures that abort `initialize()` because of the shape of
    /// the dependency graph rather than a faulty constructor.
    pub fn is_wiring_error(&self) -> bool {
        matches!(
            self,
            BeanError::NoCandidate { .. }
                | BeanError::AmbiguousCandidate { .. }
                | BeanError::CircularDependency { .. }
        )
    }
}
