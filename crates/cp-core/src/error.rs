use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("parameter error: {0}")]
    Parameter(String),

    #[error("battery level {0} outside [0, 1]")]
    BatteryLevel(f64),
}

pub type CoreResult<T> = Result<T, CoreError>;
