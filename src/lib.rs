//! Stridebuf - owned handles over a native strided buffer runtime
//!
//! A [`Buffer`] owns one opaque native N-dimensional buffer and forwards
//! shape and data queries to the runtime that allocated it. Storage, layout
//! and type validation live on the native side of the boundary; the proxy
//! checks dimension indices and guarantees the native buffer is freed
//! exactly once.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │     Buffer      │  owned proxy: bounds checks, release on drop
//! └────────┬────────┘
//!          │ NativeRuntime
//!     ┌────┴─────┐
//!     ▼          ▼
//! ┌───────┐  ┌──────────┐
//! │ Host  │  │ Dynamic  │  libloading
//! └───┬───┘  └────┬─────┘
//!     └─────┬─────┘
//!           ▼
//! ┌─────────────────────┐
//! │  sbuf_* C ABI       │  handle table + dense storage
//! └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use stridebuf::{Buffer, ElementType};
//!
//! let scalar = Buffer::new(ElementType::UINT8, &[]).unwrap();
//! assert_eq!(scalar.dimensions(), 0);
//!
//! let image = Buffer::new(ElementType::UINT8, &[640, 480]).unwrap();
//! for i in 0..image.dimensions() {
//!     println!("extent[{}] = {}", i, image.extent(i).unwrap());
//! }
//! ```

#![warn(clippy::all)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod ffi;
pub mod runtime;
pub mod types;

pub use buffer::Buffer;
pub use config::{ConfigError, StridebufConfig};
pub use error::{BufferError, BufferResult, DimensionQuery};
pub use ffi::{host_runtime, DynamicRuntime, HostRuntime, LibraryLoader, NativeRuntime, RawView};
pub use runtime::RawHandle;
pub use types::{ElementType, TypeCode};
