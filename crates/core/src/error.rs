use thiserror::Error;

/// Record kinds that can be looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Flight,
    Crew,
    Alert,
    BackupPlan,
    DutyRecord,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Flight => write!(f, "flight"),
            RecordKind::Crew => write!(f, "crew member"),
            RecordKind::Alert => write!(f, "alert"),
            RecordKind::BackupPlan => write!(f, "backup plan"),
            RecordKind::DutyRecord => write!(f, "duty record"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
