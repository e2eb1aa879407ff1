/// Invalid use of an update transaction.
///
/// These are caller bugs, reported instead of touching the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// No transaction was ever started on this session.
    NotStarted,
    /// The transaction has already ended.
    Closed { op: u64 },
    /// A newer transaction was started before this one ended.
    Superseded { op: u64, current: u64 },
}

impl std::fmt::Display for UpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateError::NotStarted => {
                write!(f, "No update in progress. Call update_start first.")
            }
            UpdateError::Closed { op } => {
                write!(f, "Update #{} has already ended", op)
            }
            UpdateError::Superseded { op, current } => {
                write!(f, "Update #{} was superseded by update #{}", op, current)
            }
        }
    }
}

impl std::error::Error for UpdateError {}
