//! Native Buffer Runtime
//!
//! The storage side of the crate: dense strided buffers kept in a global
//! handle table. Nothing in here is called directly by [`crate::Buffer`];
//! it is reached only through the C entry points in [`crate::ffi`].
//!
//! The handle table itself is not public:
//!
//! ```compile_fail,E0603
//! use stridebuf::runtime::HandleTable;
//! ```

mod dense;
mod table;

pub use dense::{dense_layout, validate_type, AllocError, DenseBuffer, Dimension};
pub(crate) use table::HandleTable;
pub use table::{RawHandle, NULL_HANDLE};
