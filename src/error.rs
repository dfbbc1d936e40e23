/// Error taxonomy for cube operations.
///
/// Recoverable errors (`InvalidFace`, `BusyRejected`, `InvalidMoveSymbol`)
/// reject a single request and leave the lattice untouched. A
/// `ConsistencyFault` means the lattice itself is corrupt and the
/// scheduler stops animating until the next reset.

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CubeError {
    #[error("invalid face: {0:?}")]
    InvalidFace(String),

    #[error("a turn is already in flight")]
    BusyRejected,

    #[error("lattice consistency fault: {0}")]
    ConsistencyFault(String),

    #[error("invalid move symbol: {0:?}")]
    InvalidMoveSymbol(String),
}

impl CubeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CubeError::ConsistencyFault(_))
    }
}
