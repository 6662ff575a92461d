use thiserror::Error;

pub type Result<T> = std::result::Result<T, AllocError>;

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("Unknown vessel: {name}")]
    UnknownVessel { name: String },

    #[error("Unknown cargo: {name}")]
    UnknownCargo { name: String },

    #[error("Invalid vessel {name}: {message}")]
    InvalidVessel { name: String, message: String },

    #[error("Invalid cargo {name}: {message}")]
    InvalidCargo { name: String, message: String },

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    /// Exhaustive search was requested for a fleet the permutation
    /// generator cannot handle.
    #[error("Exhaustive search supports at most {limit} vessels, fleet has {fleet}")]
    SearchTooLarge { fleet: usize, limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl AllocError {
    pub fn unknown_vessel(name: impl Into<String>) -> Self {
        Self::UnknownVessel { name: name.into() }
    }

    pub fn unknown_cargo(name: impl Into<String>) -> Self {
        Self::UnknownCargo { name: name.into() }
    }

    pub fn invalid_vessel(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidVessel {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_cargo(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCargo {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }
}
