use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid forecast: {reason}")]
    InvalidForecast { reason: String },

    #[error("Invalid hourly rate: {reason}")]
    InvalidRate { reason: String },

    #[error("Malformed staffing window {start}-{end}: {reason}")]
    MalformedWindow {
        start:  String,
        end:    String,
        reason: String,
    },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid revenue profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("Stage '{stage}' needs '{needs}', which no earlier stage produced")]
    MissingStageOutput {
        stage: &'static str,
        needs: &'static str,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlanError {
    /// True for errors caused by the request's inputs (as opposed to
    /// storage or wiring failures). These are reported as rejections.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PlanError::InvalidForecast { .. }
                | PlanError::InvalidRate { .. }
                | PlanError::InvalidProfile { .. }
                | PlanError::MalformedWindow { .. }
                | PlanError::InvalidParameter { .. }
        )
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
