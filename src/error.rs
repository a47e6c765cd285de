use thiserror::Error;

#[derive(Debug, Error)]
pub enum RowReduceError {
    #[error("malformed input: length {len} is not n*(n+1) for any positive n")]
    MalformedInput { len: usize },

    #[error("singular system: pivot magnitude {magnitude:e} at step {step}")]
    Singular { step: usize, magnitude: f64 },

    #[error("shape mismatch between workers: root has n={expected}, a worker's input is off by {deviation}")]
    ShapeMismatch { expected: usize, deviation: usize },

    #[error("pivot row {row} is not owned by any worker ({rows} rows distributed)")]
    UnownedRow { row: usize, rows: usize },

    #[error("Solve error: {0}")]
    Solve(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RowReduceError>;
