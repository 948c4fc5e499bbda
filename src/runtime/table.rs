//! Handle Table
//!
//! Process-global storage mapping opaque handles to live buffers. Handles are
//! never reused within a process; `0` is never issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::dense::DenseBuffer;

/// Opaque identifier of a live native buffer
pub type RawHandle = u64;

/// The handle value that never refers to a buffer
pub const NULL_HANDLE: RawHandle = 0;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

fn next_handle() -> RawHandle {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

lazy_static::lazy_static! {
    /// Buffers reachable from across the FFI boundary
    static ref BUFFERS: RwLock<HashMap<RawHandle, DenseBuffer>> = RwLock::new(HashMap::new());
}

/// Manager for native buffer handles
///
/// Crate-private: removing an entry frees storage that views handed out by
/// `sbuf_data` may still point into.
pub(crate) struct HandleTable;

impl HandleTable {
    /// Store a buffer and return its handle
    pub fn insert(buffer: DenseBuffer) -> RawHandle {
        let handle = next_handle();
        BUFFERS.write().insert(handle, buffer);
        handle
    }

    /// Read a buffer by handle
    pub fn with<F, R>(handle: RawHandle, f: F) -> Option<R>
    where
        F: FnOnce(&DenseBuffer) -> R,
    {
        BUFFERS.read().get(&handle).map(f)
    }

    /// Mutate a buffer by handle
    pub fn with_mut<F, R>(handle: RawHandle, f: F) -> Option<R>
    where
        F: FnOnce(&mut DenseBuffer) -> R,
    {
        BUFFERS.write().get_mut(&handle).map(f)
    }

    /// Remove a buffer by handle and return it
    pub fn remove(handle: RawHandle) -> Option<DenseBuffer> {
        BUFFERS.write().remove(&handle)
    }

    /// Check if a handle refers to a live buffer
    pub fn contains(handle: RawHandle) -> bool {
        BUFFERS.read().contains_key(&handle)
    }
}
