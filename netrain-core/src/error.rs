use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid queue capacity {0} (must be at least 1)")]
    InvalidCapacity(usize),

    #[error("Invalid text limit {0} (must be 1..={max})", max = crate::events::MAX_EVENT_TEXT)]
    InvalidTextLimit(usize),
}
