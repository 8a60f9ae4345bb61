//! Property cell errors

use crate::store::CellId;
use crate::value::ValueKind;
use thiserror::Error;

/// Errors surfaced by [`PropertyStore`](crate::PropertyStore) operations.
///
/// All of these are detected synchronously at the offending call; none leave
/// the store partially mutated.
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("cell is read-only")]
    ReadOnly(CellId),

    #[error("binding would create a cycle")]
    CyclicBinding { cell: CellId, src: CellId },

    #[error("cell no longer exists")]
    DeadCell(CellId),

    #[error("value kind {got:?} does not match cell kind {expected:?}")]
    TypeMismatch { expected: ValueKind, got: ValueKind },
}

pub type Result<T> = std::result::Result<T, PropertyError>;
