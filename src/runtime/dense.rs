//! Dense Strided Storage
//!
//! The buffer representation behind every native handle: one zeroed
//! allocation plus per-dimension `min`/`extent`/`stride` metadata, laid out
//! densely with the first dimension innermost.

use thiserror::Error;

use crate::types::{ElementType, TypeCode};

/// Reasons the runtime refuses an allocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("unknown type code {0}")]
    UnknownTypeCode(u8),

    #[error("unsupported element type {0}")]
    UnsupportedType(ElementType),

    #[error("lanes must be at least 1")]
    ZeroLanes,

    #[error("negative extent {extent} in dimension {dimension}")]
    NegativeExtent { dimension: usize, extent: i32 },

    #[error("too many dimensions: {0}")]
    TooManyDimensions(usize),

    #[error("buffer too large: {0:?}")]
    TooLarge(Vec<i32>),
}

/// Metadata of one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    /// Coordinate of the first element
    pub min: i32,
    /// Number of elements along this axis
    pub extent: i32,
    /// Distance in elements between neighbours along this axis
    pub stride: i32,
}

/// Decode and check a raw element type descriptor.
pub fn validate_type(code: u8, bits: u8, lanes: u16) -> Result<ElementType, AllocError> {
    let code = TypeCode::from_raw(code).ok_or(AllocError::UnknownTypeCode(code))?;
    if lanes == 0 {
        return Err(AllocError::ZeroLanes);
    }

    let ty = ElementType::with_lanes(code, bits, lanes);
    let supported = match code {
        TypeCode::Int => matches!(bits, 8 | 16 | 32 | 64),
        TypeCode::UInt => matches!(bits, 1 | 8 | 16 | 32 | 64),
        TypeCode::Float => matches!(bits, 16 | 32 | 64),
        TypeCode::Handle => bits == 64,
    };
    if !supported {
        return Err(AllocError::UnsupportedType(ty));
    }

    Ok(ty)
}

/// Per-axis metadata and element count of a dense buffer with these sizes.
///
/// Axis 0 is innermost. An empty axis contributes a factor of 1 to the
/// strides of the axes after it.
pub fn dense_layout(sizes: &[i32]) -> Result<(Vec<Dimension>, usize), AllocError> {
    if sizes.len() > i32::MAX as usize {
        return Err(AllocError::TooManyDimensions(sizes.len()));
    }

    let too_large = || AllocError::TooLarge(sizes.to_vec());
    let mut dims: Vec<Dimension> = Vec::with_capacity(sizes.len());
    let mut elements: usize = 1;

    for (dimension, &extent) in sizes.iter().enumerate() {
        if extent < 0 {
            return Err(AllocError::NegativeExtent { dimension, extent });
        }
        let stride = match dims.last() {
            Some(prev) => prev
                .stride
                .checked_mul(prev.extent.max(1))
                .ok_or_else(too_large)?,
            None => 1,
        };
        dims.push(Dimension {
            min: 0,
            extent,
            stride,
        });
        elements = elements.checked_mul(extent as usize).ok_or_else(too_large)?;
    }

    Ok((dims, elements))
}

/// An owned, densely packed N-dimensional buffer
#[derive(Debug)]
pub struct DenseBuffer {
    element_type: ElementType,
    dims: Vec<Dimension>,
    data: Box<[u8]>,
}

impl DenseBuffer {
    /// Allocate a zeroed buffer with `min = 0` and dense strides
    pub fn new(element_type: ElementType, sizes: &[i32]) -> Result<Self, AllocError> {
        let (dims, elements) = dense_layout(sizes)?;
        let bytes = elements
            .checked_mul(element_type.bytes())
            .filter(|&b| b <= isize::MAX as usize)
            .ok_or_else(|| AllocError::TooLarge(sizes.to_vec()))?;

        Ok(Self {
            element_type,
            dims,
            data: vec![0u8; bytes].into_boxed_slice(),
        })
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn dimensions(&self) -> usize {
        self.dims.len()
    }

    /// Metadata of axis `i`, if present
    pub fn dim(&self, i: usize) -> Option<&Dimension> {
        self.dims.get(i)
    }

    /// Unchecked-style accessors: an axis that does not exist reads as 0.
    pub fn min(&self, i: usize) -> i32 {
        self.dim(i).map_or(0, |d| d.min)
    }

    pub fn extent(&self, i: usize) -> i32 {
        self.dim(i).map_or(0, |d| d.extent)
    }

    pub fn stride(&self, i: usize) -> i32 {
        self.dim(i).map_or(0, |d| d.stride)
    }

    /// Extent of axis 0, or 1 when the buffer has no such axis
    pub fn width(&self) -> i32 {
        self.dim(0).map_or(1, |d| d.extent)
    }

    /// Extent of axis 1, or 1 when the buffer has no such axis
    pub fn height(&self) -> i32 {
        self.dim(1).map_or(1, |d| d.extent)
    }

    /// Extent of axis 2, or 1 when the buffer has no such axis
    pub fn channels(&self) -> i32 {
        self.dim(2).map_or(1, |d| d.extent)
    }

    /// Number of addressable elements (1 for a 0-dimensional buffer)
    pub fn element_count(&self) -> usize {
        self.dims.iter().map(|d| d.extent as usize).product()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pointer to the first byte; stable for the lifetime of the buffer
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }
}
