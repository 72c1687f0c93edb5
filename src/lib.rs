//! Strided n-dimensional array views over borrowed buffers.
//!
//! This crate implements the view/indexing model of a strided tensor
//! runtime: a logical n-dimensional array is described by a shape, a set of
//! signed per-dimension strides, a starting offset into an externally owned
//! buffer, and a memory-order convention. On top of that model it provides
//! the index arithmetic for translating between subscripts, linear view
//! indices, and buffer offsets, and a dispatcher that selects the fastest
//! correct traversal strategy for bulk element-wise operations.
//!
//! # Core Types
//!
//! - [`StridedView`] / [`StridedViewMut`]: zero-copy strided views over
//!   existing slices
//! - [`Order`]: row-major vs. column-major index decomposition
//! - [`IndexMode`]: policy for out-of-range indices (error, clamp, wrap,
//!   normalize), applied per linear index and per subscript
//!
//! # Index Arithmetic
//!
//! - [`shape_to_strides`], [`strides_to_offset`]: canonical layout helpers
//! - [`sub_to_ind`] / [`ind_to_sub`]: subscripts to buffer offset and back
//! - [`vind_to_bind`] / [`bind_to_vind`]: linear view index to buffer offset
//!   and back
//! - [`resolve_index`]: a single index against an inclusive bound
//!
//! # Bulk Traversal
//!
//! - [`nullary`]: fill an output view from a value-producing callback
//! - [`unary`]: map one input view onto a same-shaped output view
//! - [`fill`] / [`copy_into`]: common special cases of the above
//!
//! The dispatcher inspects rank, shape, stride signs, and reachable memory
//! spans to pick among a scalar short-circuit, a single strided loop
//! (possibly after squeezing singleton dimensions or flattening a
//! contiguous view), specialized nested loops, cache-blocked tiled loops,
//! and a fully generic index-translating fallback. Every strategy produces
//! the same elements in the same logical correspondence; selection is purely
//! a performance decision.
//!
//! # Example
//!
//! ```rust
//! use ndview::{unary, Order, StridedView, StridedViewMut};
//!
//! let src = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let mut dst = vec![0.0; 6];
//!
//! let x = StridedView::contiguous(&src, vec![2, 3], Order::RowMajor).unwrap();
//! let mut y =
//!     StridedViewMut::contiguous(&mut dst, vec![2, 3], Order::RowMajor).unwrap();
//!
//! unary(&x, &mut y, |v| v * 10.0).unwrap();
//! assert_eq!(dst, vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
//! ```
//!
//! # Reversed storage
//!
//! Strides may be negative, in which case `offset` addresses the first
//! logical element and the buffer is walked backward. A view constructed
//! with `offset == 0` is always interpreted as ordered: negative strides
//! then contribute their magnitude, so element `0` of the view corresponds
//! to the start of the buffer regardless of storage direction.
//!
//! # Ownership
//!
//! Views never own buffer memory. Many views may alias one buffer; the
//! borrow checker enforces that a mutable view has exclusive access for its
//! lifetime, which is the non-overlap contract bulk operations rely on.

mod convert;
mod dispatch;
mod kernel;
mod mode;
mod ops;
mod order;
mod view;

// ============================================================================
// Index modes and resolution
// ============================================================================
pub use mode::{clamp_index, normalize_index, resolve_index, wrap_index, IndexMode};

// ============================================================================
// Memory order and stride classification
// ============================================================================
pub use order::{iteration_order, strides_order, Order, StridesOrder};

// ============================================================================
// Coordinate converters
// ============================================================================
pub use convert::{
    bind_to_vind, ind_to_sub, minmax_buffer_index, numel, shape_to_strides, strides_to_offset,
    sub_to_ind, vind_to_bind,
};

// ============================================================================
// View descriptors
// ============================================================================
pub use view::{Flags, StridedView, StridedViewMut};

// ============================================================================
// Dispatch and operations
// ============================================================================
pub use dispatch::{nullary, unary, MAX_BLOCKED_NDIMS, MAX_DIRECT_NDIMS};
pub use ops::{copy_into, fill};

// ============================================================================
// Constants
// ============================================================================

/// Byte budget for one edge of a cache-blocked tile.
///
/// Tiled iteration chunks every dimension into runs of
/// `BLOCK_SIZE_IN_BYTES / elem_size` elements, so that a two-dimensional
/// tile of the widest participating element type stays within a typical L1
/// data cache.
pub const BLOCK_SIZE_IN_BYTES: usize = 512;

/// Tile edge length, in elements, used when the element width is unknown.
pub const BLOCK_SIZE_IN_ELEMENTS: usize = 64;

// ============================================================================
// Error types
// ============================================================================

/// Errors reported by view construction, element access, and bulk dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Array shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// An index failed resolution against its bound.
    #[error("index {idx} out of range for maximum index {max}")]
    OutOfBounds { idx: isize, max: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and shape length mismatch")]
    StrideLengthMismatch,

    /// The view would reach outside its buffer.
    #[error("view exceeds buffer bounds")]
    OffsetOverflow,

    /// At least one subscript mode is required.
    #[error("empty subscript mode list")]
    EmptySubmodes,
}

/// Result type for strided view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
