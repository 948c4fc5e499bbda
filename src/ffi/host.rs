//! In-process runtime: the `sbuf_*` entry points linked into this binary.

use std::sync::Arc;

use super::abi;
use super::{NativeRuntime, RawView};
use crate::runtime::{RawHandle, NULL_HANDLE};

/// Runtime backed by the C ABI compiled into this crate
#[derive(Debug, Default, Clone, Copy)]
pub struct HostRuntime;

/// The runtime used by [`crate::Buffer::new`]
pub fn host_runtime() -> Arc<dyn NativeRuntime> {
    Arc::new(HostRuntime)
}

// Safety: the in-process ABI reads unknown or stale handles as empty, and
// storage handed out by `sbuf_data` lives in a boxed slice owned by the
// handle table entry until `sbuf_delete_buffer` removes it.
unsafe impl NativeRuntime for HostRuntime {
    fn name(&self) -> &str {
        "host"
    }

    fn allocate(
        &self,
        type_code: u8,
        bits: u8,
        lanes: u16,
        sizes: &[i32],
    ) -> Result<RawHandle, String> {
        // Safety: the slice is valid for `sizes.len()` reads.
        let handle =
            unsafe { abi::sbuf_new_buffer(type_code, bits, lanes, sizes.as_ptr(), sizes.len()) };
        if handle == NULL_HANDLE {
            return Err(abi::last_error_message()
                .unwrap_or_else(|| "native allocation failed".to_string()));
        }
        Ok(handle)
    }

    unsafe fn deallocate(&self, handle: RawHandle) -> bool {
        // Safety: the caller guarantees no view of `handle` outlives this call.
        unsafe { abi::sbuf_delete_buffer(handle) }
    }

    // The queries below tolerate any handle value in this runtime.
    fn dimensions(&self, handle: RawHandle) -> i32 {
        unsafe { abi::sbuf_dimensions(handle) }
    }

    fn min(&self, handle: RawHandle, i: i32) -> i32 {
        unsafe { abi::sbuf_min(handle, i) }
    }

    fn extent(&self, handle: RawHandle, i: i32) -> i32 {
        unsafe { abi::sbuf_extent(handle, i) }
    }

    fn stride(&self, handle: RawHandle, i: i32) -> i32 {
        unsafe { abi::sbuf_stride(handle, i) }
    }

    fn width(&self, handle: RawHandle) -> i32 {
        unsafe { abi::sbuf_width(handle) }
    }

    fn height(&self, handle: RawHandle) -> i32 {
        unsafe { abi::sbuf_height(handle) }
    }

    fn channels(&self, handle: RawHandle) -> i32 {
        unsafe { abi::sbuf_channels(handle) }
    }

    fn data(&self, handle: RawHandle) -> RawView {
        let mut len = 0usize;
        // Safety: `len` is a valid out-parameter.
        let ptr = unsafe { abi::sbuf_data(handle, &mut len) };
        RawView { ptr, len }
    }
}
