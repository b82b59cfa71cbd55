//! Persistent focuser position storage
//!
//! The focuser position survives restarts as a single integer expressed at
//! the highest microstep resolution, so it stays valid whatever resolution
//! the next session starts with.

/// Errors from position storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Nothing has been stored yet
    NotFound,
    /// Underlying medium failed
    Io,
    /// Stored data could not be parsed
    Corrupted,
}

/// Single-value position store
pub trait PositionStore {
    /// Read the stored canonical position
    fn load(&mut self) -> Result<i32, StoreError>;

    /// Replace the stored canonical position
    fn save(&mut self, position: i32) -> Result<(), StoreError>;
}
