//! Durable snapshots of the node state.
//!
//! The device may lose power at any instruction boundary, so the pipeline
//! commits the whole [`NodeState`] through a [`CheckpointStore`] after every
//! stage. The store's one hard guarantee is atomicity: a commit is either
//! fully visible to the next `load` or not visible at all, never partially.
//! On the real device this seam is backed by FRAM or a flash journal; on
//! the host it is a RAM buffer, optionally wrapped with fault injection.
//!
//! Snapshots are `postcard`-encoded into a fixed-capacity buffer.

use heapless::Vec;
use thiserror_no_std::Error;

use crate::pipeline::NodeState;

/// Upper bound on an encoded snapshot. The node state is a few hundred
/// bytes of windows and cursors even with every channel at a varint
/// worst case, so this leaves comfortable margin.
pub const SNAPSHOT_CAPACITY: usize = 1024;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] postcard::Error),
    #[error("snapshot exceeds {SNAPSHOT_CAPACITY} byte capacity")]
    Capacity,
    #[error("power lost before the snapshot was committed")]
    Interrupted,
}

/// Atomic load/commit of the durable node state.
pub trait CheckpointStore {
    /// Last committed state, or `None` on a factory-fresh device.
    fn load(&mut self) -> Result<Option<NodeState>, StoreError>;

    /// Durably replace the committed state. All-or-nothing: an error means
    /// the previous snapshot is still intact.
    fn commit(&mut self, state: &NodeState) -> Result<(), StoreError>;
}

impl<C: CheckpointStore> CheckpointStore for &mut C {
    fn load(&mut self) -> Result<Option<NodeState>, StoreError> {
        (**self).load()
    }

    fn commit(&mut self, state: &NodeState) -> Result<(), StoreError> {
        (**self).commit(state)
    }
}

/// Volatile store backing host tests and the simulator.
///
/// Holds the serialized snapshot exactly the way a persistent backend
/// would, so load always round-trips through the wire encoding. The commit
/// only replaces the stored snapshot after encoding fully succeeds.
#[derive(Debug, Default)]
pub struct RamStore {
    snapshot: Option<Vec<u8, SNAPSHOT_CAPACITY>>,
}

impl RamStore {
    pub const fn new() -> Self {
        Self { snapshot: None }
    }

    /// Size of the committed snapshot, if any.
    pub fn snapshot_len(&self) -> Option<usize> {
        self.snapshot.as_ref().map(|v| v.len())
    }
}

impl CheckpointStore for RamStore {
    fn load(&mut self) -> Result<Option<NodeState>, StoreError> {
        match &self.snapshot {
            None => Ok(None),
            Some(bytes) => Ok(Some(postcard::from_bytes(bytes)?)),
        }
    }

    fn commit(&mut self, state: &NodeState) -> Result<(), StoreError> {
        let mut buf = [0u8; SNAPSHOT_CAPACITY];
        let used = postcard::to_slice(state, &mut buf)?;
        let encoded = Vec::from_slice(used).map_err(|_| StoreError::Capacity)?;
        self.snapshot = Some(encoded);
        Ok(())
    }
}
