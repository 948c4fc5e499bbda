//! FFI Module for Stridebuf
//!
//! The foreign-function boundary between [`crate::Buffer`] and the native
//! buffer runtime.
//!
//! # Architecture
//!
//! ```text
//! Buffer (owned proxy, bounds checks)
//!       │
//!       ▼
//! NativeRuntime (entry-point table)
//!       │
//!   ┌───┴──────────────┐
//!   ▼                  ▼
//! HostRuntime     DynamicRuntime (libloading)
//!   │                  │
//!   ▼                  ▼
//! sbuf_* C ABI    sbuf_* symbols in a shared library
//! ```
//!
//! # Contract split
//!
//! The proxy enforces dimension indices. Everything else (type/shape
//! validity, use of a released handle) is the native runtime's business.
//!
//! # Example
//!
//! ```ignore
//! let mut loader = LibraryLoader::new();
//! loader.add_search_path("target/release");
//! let runtime = loader.load("stridebuf")?;
//! let buffer = Buffer::with_runtime(runtime, ElementType::UINT8, &[640, 480])?;
//! ```

pub mod abi;
mod host;
mod loader;

pub use host::{host_runtime, HostRuntime};
pub use loader::{DynamicRuntime, LibraryLoader};

use crate::runtime::RawHandle;

/// Raw, non-owning view of native storage
#[derive(Debug, Clone, Copy)]
pub struct RawView {
    pub ptr: *mut u8,
    pub len: usize,
}

impl RawView {
    /// The view of a handle that has no storage
    pub fn empty() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }
}

/// The native entry points a [`crate::Buffer`] forwards to.
///
/// Per-dimension queries may be unchecked; callers validate the index first.
///
/// # Safety
/// Implementors guarantee that:
/// - every query, including [`data`](Self::data), is memory safe for any
///   handle value, live or not;
/// - a non-empty [`RawView`] returned by `data` is valid for reads and writes
///   of `len` bytes, is not reachable through any other handle, and stays at
///   the same address until `deallocate` is called for that handle.
///
/// Freeing storage behind a live view cannot be done from safe code:
///
/// ```compile_fail,E0133
/// use stridebuf::{Buffer, ElementType, NativeRuntime};
///
/// let buf = Buffer::new(ElementType::UINT8, &[4]).unwrap();
/// let view = buf.read_only_data();
/// buf.runtime().deallocate(buf.raw_handle());
/// let _ = view[0];
/// ```
///
/// ```compile_fail,E0133
/// use stridebuf::{ffi::abi::sbuf_delete_buffer, Buffer, ElementType};
///
/// let buf = Buffer::new(ElementType::UINT8, &[4]).unwrap();
/// let view = buf.read_only_data();
/// sbuf_delete_buffer(buf.raw_handle());
/// let _ = view[0];
/// ```
pub unsafe trait NativeRuntime: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Allocate a buffer. `Err` carries the native failure message.
    fn allocate(
        &self,
        type_code: u8,
        bits: u8,
        lanes: u16,
        sizes: &[i32],
    ) -> Result<RawHandle, String>;

    /// Free a buffer; returns `false` when the handle was not live.
    ///
    /// # Safety
    /// The caller must own `handle`, and no view obtained from
    /// [`data`](Self::data) for it may be used afterwards.
    unsafe fn deallocate(&self, handle: RawHandle) -> bool;

    fn dimensions(&self, handle: RawHandle) -> i32;

    fn min(&self, handle: RawHandle, i: i32) -> i32;

    fn extent(&self, handle: RawHandle, i: i32) -> i32;

    fn stride(&self, handle: RawHandle, i: i32) -> i32;

    fn width(&self, handle: RawHandle) -> i32;

    fn height(&self, handle: RawHandle) -> i32;

    fn channels(&self, handle: RawHandle) -> i32;

    /// Storage of a live buffer; ownership stays with the runtime
    fn data(&self, handle: RawHandle) -> RawView;
}

#[cfg(test)]
mod tests;
