//! Strided view descriptors over borrowed buffers.
//!
//! A view describes a logical n-dimensional array living inside an
//! externally owned slice: a shape, signed per-dimension element strides,
//! the offset of the first logical element, a memory-order convention, and
//! the index policies applied to out-of-range access. Views never own or
//! free buffer memory; reshaping means constructing a new descriptor over
//! the same buffer.
//!
//! The element count and contiguity flags are derived once at construction
//! and immutable afterward. Construction validates that every address the
//! view can reach stays inside the buffer, which is what lets the bulk
//! traversal kernels walk raw pointers without per-element checks.

use crate::convert::{
    effective_stride, minmax_buffer_index, numel, shape_to_strides, sub_to_ind, vind_to_bind,
};
use crate::mode::IndexMode;
use crate::order::{strides_order, Order, StridesOrder};
use crate::{Result, ViewError};

/// Contiguity classification of a view, computed at construction.
///
/// `contiguous` means the buffer addresses the view can touch form one
/// unbroken run of exactly `len` elements. The per-order flags additionally
/// require the stride magnitudes to follow that order's canonical
/// monotonicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    /// Touched addresses form a single gapless run.
    pub contiguous: bool,
    /// Contiguous with non-increasing stride magnitudes.
    pub row_major_contiguous: bool,
    /// Contiguous with non-decreasing stride magnitudes.
    pub col_major_contiguous: bool,
}

pub(crate) fn compute_flags(shape: &[usize], strides: &[isize], offset: usize) -> Flags {
    let len = numel(shape);
    if len == 0 {
        return Flags::default();
    }
    let (min, max) = minmax_buffer_index(shape, strides, offset);
    let contiguous = max - min + 1 == len as isize;
    let so = strides_order(strides);
    Flags {
        contiguous,
        row_major_contiguous: contiguous
            && matches!(so, StridesOrder::RowMajor | StridesOrder::Both),
        col_major_contiguous: contiguous
            && matches!(so, StridesOrder::ColMajor | StridesOrder::Both),
    }
}

/// Check that a descriptor stays within a buffer of `buf_len` elements.
///
/// Empty views have nothing to address and always pass.
pub(crate) fn validate_geometry(
    buf_len: usize,
    shape: &[usize],
    strides: &[isize],
    offset: usize,
) -> Result<()> {
    if strides.len() != shape.len() {
        return Err(ViewError::StrideLengthMismatch);
    }
    if numel(shape) == 0 {
        return Ok(());
    }
    let (min, max) = minmax_buffer_index(shape, strides, offset);
    if min < 0 || max as usize >= buf_len {
        return Err(ViewError::OffsetOverflow);
    }
    Ok(())
}

/// An immutable strided view over a borrowed buffer.
///
/// # Example
/// ```
/// use ndview::{Order, StridedView};
///
/// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let view = StridedView::contiguous(&data, vec![2, 3], Order::RowMajor).unwrap();
///
/// assert_eq!(view.len(), 6);
/// assert_eq!(*view.get(&[1, 2]).unwrap(), 6.0);
/// ```
#[derive(Debug)]
pub struct StridedView<'a, T> {
    data: &'a [T],
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
    index_mode: IndexMode,
    submodes: Vec<IndexMode>,
    len: usize,
    flags: Flags,
}

/// A mutable strided view over a borrowed buffer.
///
/// Same descriptor model as [`StridedView`], with element mutation. The
/// exclusive borrow of the buffer is what guarantees bulk operations a
/// write target no other live view aliases.
#[derive(Debug)]
pub struct StridedViewMut<'a, T> {
    data: &'a mut [T],
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    order: Order,
    index_mode: IndexMode,
    submodes: Vec<IndexMode>,
    len: usize,
    flags: Flags,
}

impl<'a, T> StridedView<'a, T> {
    /// Create a view from a full descriptor.
    ///
    /// `strides` are signed element counts; `offset` locates the first
    /// logical element. `submodes` are recycled across dimensions and must
    /// contain at least one entry.
    ///
    /// # Errors
    /// Fails if the stride list length disagrees with the shape, the mode
    /// list is empty, or any reachable address falls outside `data`.
    pub fn new(
        data: &'a [T],
        shape: Vec<usize>,
        strides: Vec<isize>,
        offset: usize,
        order: Order,
        index_mode: IndexMode,
        submodes: Vec<IndexMode>,
    ) -> Result<Self> {
        validate_geometry(data.len(), &shape, &strides, offset)?;
        if submodes.is_empty() {
            return Err(ViewError::EmptySubmodes);
        }
        let len = numel(&shape);
        let flags = compute_flags(&shape, &strides, offset);
        Ok(Self {
            data,
            shape,
            strides,
            offset,
            order,
            index_mode,
            submodes,
            len,
            flags,
        })
    }

    /// Create a dense view with canonical strides for `order`, offset 0,
    /// and rejecting index modes.
    pub fn contiguous(data: &'a [T], shape: Vec<usize>, order: Order) -> Result<Self> {
        let strides = shape_to_strides(&shape, order);
        Self::new(
            data,
            shape,
            strides,
            0,
            order,
            IndexMode::default(),
            vec![IndexMode::default()],
        )
    }

    /// Returns the shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the signed element strides as given at construction.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Returns the offset of the first logical element.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the memory-order convention.
    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    /// Returns the policy applied to linear view indices.
    #[inline]
    pub fn index_mode(&self) -> IndexMode {
        self.index_mode
    }

    /// Returns the per-dimension subscript policies.
    #[inline]
    pub fn submodes(&self) -> &[IndexMode] {
        &self.submodes
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if any dimension has extent zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the rank.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the element width in bytes.
    #[inline]
    pub fn elem_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    /// Returns the total element storage in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Returns the contiguity flags.
    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Returns the underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Raw pointer to the first logical element.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr().wrapping_add(self.offset)
    }

    /// Look up an element by subscripts.
    ///
    /// Each subscript is resolved against its dimension by the view's
    /// subscript modes; a failed resolution aborts only this access.
    pub fn get(&self, subscripts: &[isize]) -> Result<&'a T> {
        let i = sub_to_ind(
            &self.shape,
            &self.strides,
            self.offset,
            subscripts,
            &self.submodes,
        )?;
        Ok(&self.data[i])
    }

    /// Look up an element by linear view index under the view's index
    /// mode.
    pub fn iget(&self, idx: isize) -> Result<&'a T> {
        let i = vind_to_bind(
            &self.shape,
            &self.strides,
            self.offset,
            self.order,
            idx,
            self.index_mode,
        )?;
        Ok(&self.data[i])
    }

    /// Strides used for traversal, with the zero-offset ordering rule
    /// applied.
    pub(crate) fn iter_strides(&self) -> Vec<isize> {
        self.strides
            .iter()
            .map(|&s| effective_stride(s, self.offset))
            .collect()
    }

    pub(crate) fn buf_len(&self) -> usize {
        self.data.len()
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    /// Create a mutable view from a full descriptor.
    ///
    /// See [`StridedView::new`] for the descriptor contract.
    pub fn new(
        data: &'a mut [T],
        shape: Vec<usize>,
        strides: Vec<isize>,
        offset: usize,
        order: Order,
        index_mode: IndexMode,
        submodes: Vec<IndexMode>,
    ) -> Result<Self> {
        validate_geometry(data.len(), &shape, &strides, offset)?;
        if submodes.is_empty() {
            return Err(ViewError::EmptySubmodes);
        }
        let len = numel(&shape);
        let flags = compute_flags(&shape, &strides, offset);
        Ok(Self {
            data,
            shape,
            strides,
            offset,
            order,
            index_mode,
            submodes,
            len,
            flags,
        })
    }

    /// Create a dense mutable view with canonical strides for `order`.
    pub fn contiguous(data: &'a mut [T], shape: Vec<usize>, order: Order) -> Result<Self> {
        let strides = shape_to_strides(&shape, order);
        Self::new(
            data,
            shape,
            strides,
            0,
            order,
            IndexMode::default(),
            vec![IndexMode::default()],
        )
    }

    /// Returns the shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the signed element strides as given at construction.
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Returns the offset of the first logical element.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the memory-order convention.
    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    /// Returns the policy applied to linear view indices.
    #[inline]
    pub fn index_mode(&self) -> IndexMode {
        self.index_mode
    }

    /// Returns the per-dimension subscript policies.
    #[inline]
    pub fn submodes(&self) -> &[IndexMode] {
        &self.submodes
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if any dimension has extent zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the rank.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the element width in bytes.
    #[inline]
    pub fn elem_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    /// Returns the total element storage in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Returns the contiguity flags.
    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Raw pointer to the first logical element.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr().wrapping_add(self.offset)
    }

    /// Look up an element by subscripts.
    pub fn get(&self, subscripts: &[isize]) -> Result<&T> {
        let i = sub_to_ind(
            &self.shape,
            &self.strides,
            self.offset,
            subscripts,
            &self.submodes,
        )?;
        Ok(&self.data[i])
    }

    /// Mutable access to an element by subscripts.
    pub fn get_mut(&mut self, subscripts: &[isize]) -> Result<&mut T> {
        let i = sub_to_ind(
            &self.shape,
            &self.strides,
            self.offset,
            subscripts,
            &self.submodes,
        )?;
        Ok(&mut self.data[i])
    }

    /// Store `value` at the given subscripts.
    pub fn set(&mut self, subscripts: &[isize], value: T) -> Result<()> {
        *self.get_mut(subscripts)? = value;
        Ok(())
    }

    /// Look up an element by linear view index.
    pub fn iget(&self, idx: isize) -> Result<&T> {
        let i = vind_to_bind(
            &self.shape,
            &self.strides,
            self.offset,
            self.order,
            idx,
            self.index_mode,
        )?;
        Ok(&self.data[i])
    }

    /// Store `value` at the given linear view index.
    pub fn iset(&mut self, idx: isize, value: T) -> Result<()> {
        let i = vind_to_bind(
            &self.shape,
            &self.strides,
            self.offset,
            self.order,
            idx,
            self.index_mode,
        )?;
        self.data[i] = value;
        Ok(())
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            data: self.data,
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
            order: self.order,
            index_mode: self.index_mode,
            submodes: self.submodes.clone(),
            len: self.len,
            flags: self.flags,
        }
    }

    /// Strides used for traversal, with the zero-offset ordering rule
    /// applied.
    pub(crate) fn iter_strides(&self) -> Vec<isize> {
        self.strides
            .iter()
            .map(|&s| effective_stride(s, self.offset))
            .collect()
    }

    pub(crate) fn buf_len(&self) -> usize {
        self.data.len()
    }
}
