//! Owned Buffer Handle
//!
//! [`Buffer`] owns exactly one native buffer. It checks dimension indices
//! itself and forwards every other query unchanged to its [`NativeRuntime`].
//! The native buffer is freed by [`Buffer::release`] or, at the latest,
//! when the `Buffer` is dropped.
//!
//! # Example
//!
//! ```rust
//! use stridebuf::{Buffer, ElementType};
//!
//! let mut image = Buffer::new(ElementType::UINT8, &[640, 480]).unwrap();
//! assert_eq!(image.dimensions(), 2);
//! assert_eq!(image.extent(1).unwrap(), 480);
//! assert!(image.extent(2).is_err());
//!
//! image.data()[0] = 255;
//! assert_eq!(image.read_only_data()[0], 255);
//! ```

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{BufferError, BufferResult, DimensionQuery};
use crate::ffi::{host_runtime, NativeRuntime};
use crate::runtime::{RawHandle, NULL_HANDLE};
use crate::types::ElementType;

/// Owned proxy over one native N-dimensional buffer
pub struct Buffer {
    /// `NULL_HANDLE` once released
    handle: RawHandle,
    element_type: ElementType,
    runtime: Arc<dyn NativeRuntime>,
}

impl Buffer {
    /// Allocate a buffer in the in-process runtime.
    ///
    /// `sizes` holds one extent per dimension; an empty slice makes a
    /// 0-dimensional (scalar) buffer.
    pub fn new(element_type: ElementType, sizes: &[i32]) -> BufferResult<Self> {
        Self::with_runtime(host_runtime(), element_type, sizes)
    }

    /// Allocate a buffer through the given runtime
    pub fn with_runtime(
        runtime: Arc<dyn NativeRuntime>,
        element_type: ElementType,
        sizes: &[i32],
    ) -> BufferResult<Self> {
        let ElementType { code, bits, lanes } = element_type;
        let handle = runtime
            .allocate(code.as_raw(), bits, lanes, sizes)
            .map_err(BufferError::Allocation)?;
        if handle == NULL_HANDLE {
            return Err(BufferError::Allocation(format!(
                "runtime '{}' returned the null handle",
                runtime.name()
            )));
        }

        debug!(
            "allocated {} buffer {:?} as handle {} ({})",
            element_type,
            sizes,
            handle,
            runtime.name()
        );

        Ok(Self {
            handle,
            element_type,
            runtime,
        })
    }

    /// Opaque native identifier; `0` after release
    pub fn raw_handle(&self) -> RawHandle {
        self.handle
    }

    pub fn is_released(&self) -> bool {
        self.handle == NULL_HANDLE
    }

    /// Element type the buffer was constructed with
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Runtime this buffer was allocated from
    pub fn runtime(&self) -> &Arc<dyn NativeRuntime> {
        &self.runtime
    }

    pub fn dimensions(&self) -> usize {
        usize::try_from(self.runtime.dimensions(self.handle)).unwrap_or(0)
    }

    /// Validate `i` against the dimension count before any per-dimension call
    fn check_dimension(&self, query: DimensionQuery, i: usize) -> BufferResult<i32> {
        let dimensions = self.dimensions();
        if i >= dimensions {
            return Err(BufferError::DimensionOutOfBounds {
                query,
                index: i,
                dimensions,
            });
        }
        // dimensions came from an i32, so i fits
        Ok(i as i32)
    }

    /// Coordinate of the first element along axis `i`
    pub fn min(&self, i: usize) -> BufferResult<i32> {
        let i = self.check_dimension(DimensionQuery::Min, i)?;
        Ok(self.runtime.min(self.handle, i))
    }

    /// Number of elements along axis `i`
    pub fn extent(&self, i: usize) -> BufferResult<i32> {
        let i = self.check_dimension(DimensionQuery::Extent, i)?;
        Ok(self.runtime.extent(self.handle, i))
    }

    /// Element stride along axis `i`
    pub fn stride(&self, i: usize) -> BufferResult<i32> {
        let i = self.check_dimension(DimensionQuery::Stride, i)?;
        Ok(self.runtime.stride(self.handle, i))
    }

    /// Extents of all axes, innermost first
    pub fn shape(&self) -> Vec<i32> {
        (0..self.dimensions() as i32)
            .map(|i| self.runtime.extent(self.handle, i))
            .collect()
    }

    // The semantic queries are defined by the runtime, including what they
    // return for buffers with fewer axes.

    pub fn width(&self) -> i32 {
        self.runtime.width(self.handle)
    }

    pub fn height(&self) -> i32 {
        self.runtime.height(self.handle)
    }

    pub fn channels(&self) -> i32 {
        self.runtime.channels(self.handle)
    }

    /// Mutable view of the raw storage.
    ///
    /// The view borrows the buffer, so it cannot outlive it or survive a
    /// [`release`](Self::release). A released buffer yields an empty view.
    pub fn data(&mut self) -> &mut [u8] {
        let view = self.runtime.data(self.handle);
        if view.is_empty() {
            return &mut [];
        }
        // Safety: `NativeRuntime` guarantees a non-empty view is valid and
        // unaliased until the handle is deallocated, which needs `&mut self`.
        // The handle is owned by no other `Buffer`.
        unsafe { std::slice::from_raw_parts_mut(view.ptr, view.len) }
    }

    /// Read-only view of the same storage as [`data`](Self::data)
    pub fn read_only_data(&self) -> &[u8] {
        let view = self.runtime.data(self.handle);
        if view.is_empty() {
            return &[];
        }
        // Safety: as in `data`; mutation requires `&mut self`, which cannot
        // coexist with this borrow.
        unsafe { std::slice::from_raw_parts(view.ptr, view.len) }
    }

    /// Free the native buffer. Repeated calls do nothing.
    ///
    /// A failure reported by the runtime is logged and otherwise ignored;
    /// the handle is cleared either way.
    pub fn release(&mut self) {
        if self.handle == NULL_HANDLE {
            return;
        }
        // Safety: this `Buffer` owns the handle, and `&mut self` rules out a
        // live view from `data` or `read_only_data`.
        let freed = unsafe { self.runtime.deallocate(self.handle) };
        if freed {
            debug!("released handle {} ({})", self.handle, self.runtime.name());
        } else {
            warn!(
                "runtime '{}' failed to deallocate handle {}",
                self.runtime.name(),
                self.handle
            );
        }
        self.handle = NULL_HANDLE;
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle)
            .field("element_type", &self.element_type)
            .field("runtime", &self.runtime.name())
            .finish()
    }
}
