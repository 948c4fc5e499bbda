//! Exported C ABI
//!
//! The native entry points of the buffer runtime. Handles are plain `u64`s;
//! `0` signals failure on allocation, and the reason is kept in a
//! thread-local slot readable through [`sbuf_last_error`].
//!
//! Per-dimension queries are unchecked here: an unknown handle or an index
//! past the last axis reads as `0`.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use crate::runtime::{validate_type, DenseBuffer, HandleTable, RawHandle, NULL_HANDLE};

/// ABI version of the `sbuf_*` entry points
pub const ABI_VERSION: u32 = 1;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_error(message: impl Into<String>) {
    let cstr = CString::new(message.into())
        .unwrap_or_else(|_| CString::from(c"invalid error message"));
    LAST_ERROR.with(|cell| *cell.borrow_mut() = Some(cstr));
}

fn clear_error() {
    LAST_ERROR.with(|cell| *cell.borrow_mut() = None);
}

/// Last error recorded on this thread, as an owned string
pub fn last_error_message() -> Option<String> {
    LAST_ERROR.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|msg| msg.to_string_lossy().into_owned())
    })
}

fn index(i: i32) -> Option<usize> {
    usize::try_from(i).ok()
}

#[no_mangle]
pub extern "C" fn sbuf_abi_version() -> u32 {
    ABI_VERSION
}

/// Message of the last failed call on this thread, or null.
///
/// The pointer stays valid until the next `sbuf_*` call on the same thread.
#[no_mangle]
pub extern "C" fn sbuf_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| match &*cell.borrow() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

/// Allocate a zeroed buffer. Returns `0` on failure.
///
/// # Safety
/// `sizes` must point to `ndims` readable `i32`s, or may be null when
/// `ndims` is `0`.
#[no_mangle]
pub unsafe extern "C" fn sbuf_new_buffer(
    type_code: u8,
    bits: u8,
    lanes: u16,
    sizes: *const i32,
    ndims: usize,
) -> RawHandle {
    clear_error();
    let sizes: &[i32] = if ndims == 0 {
        &[]
    } else if sizes.is_null() {
        set_error("null sizes pointer with non-zero dimension count");
        return NULL_HANDLE;
    } else {
        std::slice::from_raw_parts(sizes, ndims)
    };

    let ty = match validate_type(type_code, bits, lanes) {
        Ok(ty) => ty,
        Err(err) => {
            set_error(err.to_string());
            return NULL_HANDLE;
        }
    };

    match DenseBuffer::new(ty, sizes) {
        Ok(buffer) => HandleTable::insert(buffer),
        Err(err) => {
            set_error(err.to_string());
            NULL_HANDLE
        }
    }
}

/// Free a buffer. Returns `false` for `0` or a handle that is not live.
///
/// # Safety
/// No view obtained from [`sbuf_data`] for this handle may be used after the
/// call returns.
#[no_mangle]
pub unsafe extern "C" fn sbuf_delete_buffer(handle: RawHandle) -> bool {
    clear_error();
    if handle == NULL_HANDLE {
        set_error("cannot delete the null handle");
        return false;
    }
    match HandleTable::remove(handle) {
        Some(_) => true,
        None => {
            set_error(format!("unknown buffer handle {handle}"));
            false
        }
    }
}

/// Number of dimensions of a buffer.
///
/// # Safety
/// `handle` must be `0` or a value returned by [`sbuf_new_buffer`]. This
/// runtime reads a stale handle as `0`; other libraries exporting the same
/// symbols are not required to.
#[no_mangle]
pub unsafe extern "C" fn sbuf_dimensions(handle: RawHandle) -> i32 {
    HandleTable::with(handle, |b| b.dimensions() as i32).unwrap_or(0)
}

/// # Safety
/// Same contract as [`sbuf_dimensions`].
#[no_mangle]
pub unsafe extern "C" fn sbuf_min(handle: RawHandle, i: i32) -> i32 {
    index(i)
        .and_then(|i| HandleTable::with(handle, |b| b.min(i)))
        .unwrap_or(0)
}

/// # Safety
/// Same contract as [`sbuf_dimensions`].
#[no_mangle]
pub unsafe extern "C" fn sbuf_extent(handle: RawHandle, i: i32) -> i32 {
    index(i)
        .and_then(|i| HandleTable::with(handle, |b| b.extent(i)))
        .unwrap_or(0)
}

/// # Safety
/// Same contract as [`sbuf_dimensions`].
#[no_mangle]
pub unsafe extern "C" fn sbuf_stride(handle: RawHandle, i: i32) -> i32 {
    index(i)
        .and_then(|i| HandleTable::with(handle, |b| b.stride(i)))
        .unwrap_or(0)
}

/// # Safety
/// Same contract as [`sbuf_dimensions`].
#[no_mangle]
pub unsafe extern "C" fn sbuf_width(handle: RawHandle) -> i32 {
    HandleTable::with(handle, |b| b.width()).unwrap_or(0)
}

/// # Safety
/// Same contract as [`sbuf_dimensions`].
#[no_mangle]
pub unsafe extern "C" fn sbuf_height(handle: RawHandle) -> i32 {
    HandleTable::with(handle, |b| b.height()).unwrap_or(0)
}

/// # Safety
/// Same contract as [`sbuf_dimensions`].
#[no_mangle]
pub unsafe extern "C" fn sbuf_channels(handle: RawHandle) -> i32 {
    HandleTable::with(handle, |b| b.channels()).unwrap_or(0)
}

/// Non-owning pointer to a buffer's storage; its byte length goes to `len`.
///
/// Returns null (and length 0) for an unknown handle. The storage stays
/// valid until the buffer is deleted.
///
/// # Safety
/// `len` must be null or point to writable memory for one `usize`. The
/// caller is responsible for not aliasing writes through the returned
/// pointer with other views of the same buffer, and for not using it after
/// [`sbuf_delete_buffer`].
#[no_mangle]
pub unsafe extern "C" fn sbuf_data(handle: RawHandle, len: *mut usize) -> *mut u8 {
    let view = HandleTable::with_mut(handle, |b| (b.as_mut_ptr(), b.size_in_bytes()));
    let (data, size) = view.unwrap_or((ptr::null_mut(), 0));
    if !len.is_null() {
        *len = size;
    }
    data
}
