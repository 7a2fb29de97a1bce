use crate::stage::Stage;

#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("missing required field: {0}")]
    Validation(String),
    #[error("operation is not permitted while the dossier is in stage {0:?}")]
    StageViolation(Stage),
    #[error("transition requirements unmet: {0}")]
    PreconditionFailed(String),
    #[error("dossier {0} is closed")]
    CaseClosed(String),
    #[error("document has already expired")]
    AlreadyExpired,
    #[error("document has already been completed")]
    AlreadyCompleted,
    #[error("dossier {0} has no huissier assigned")]
    NoBailiffAssigned(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("collaborator failure: {0}")]
    Collaborator(#[from] StoreError),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(String),
}
