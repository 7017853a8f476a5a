use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    /// A separator contained a non-candidate node or was empty. This must
    /// never happen on consistent inputs.
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    #[error("MIP solver error: {0}")]
    Solver(String),
}

pub type SolveResult<T> = Result<T, SolveError>;
