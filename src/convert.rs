//! Pure conversions between subscripts, linear view indices, and buffer
//! offsets.
//!
//! All functions take the view geometry (shape, signed element strides,
//! starting offset) explicitly and share no state. They honor the
//! offset-zero sign rule: when `offset == 0` a negative stride contributes
//! its magnitude, so a zero-offset view is addressed as ordered even when
//! the underlying storage runs backward. Unresolvable indices are reported
//! as `Err`; nothing here panics on out-of-range input.

use crate::mode::{resolve_index, IndexMode};
use crate::order::Order;
use crate::{Result, ViewError};

/// Number of elements addressed by `shape`.
///
/// A rank-0 shape holds a single element; any zero extent makes the array
/// empty.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Stride actually used for addressing, under the offset-zero sign rule.
#[inline]
pub(crate) fn effective_stride(stride: isize, offset: usize) -> isize {
    if offset == 0 {
        stride.abs()
    } else {
        stride
    }
}

/// Compute the canonical contiguous strides for `shape`, in element units.
///
/// Row-major gives the last dimension stride 1, each preceding dimension
/// the product of the extents to its right; column-major mirrors this.
pub fn shape_to_strides(shape: &[usize], order: Order) -> Vec<isize> {
    let n = shape.len();
    let mut strides = vec![0isize; n];
    let mut s = 1isize;
    match order {
        Order::RowMajor => {
            for i in (0..n).rev() {
                strides[i] = s;
                s *= shape[i] as isize;
            }
        }
        Order::ColMajor => {
            for i in 0..n {
                strides[i] = s;
                s *= shape[i] as isize;
            }
        }
    }
    strides
}

/// Index of the first logical element implied by a stride pattern.
///
/// Non-negative strides contribute nothing; a negative stride pushes the
/// start toward the high end of its dimension. Pairing a reversed stride
/// pattern with this offset yields a view whose element `0` sits where the
/// forward view would place its last element along that dimension.
pub fn strides_to_offset(shape: &[usize], strides: &[isize]) -> usize {
    let mut offset = 0isize;
    for (&d, &s) in shape.iter().zip(strides) {
        if s < 0 {
            offset += (-s) * d.saturating_sub(1) as isize;
        }
    }
    offset as usize
}

/// Extreme buffer indices reachable by a view, inclusive.
///
/// Uses effective strides, so a zero-offset view with negative strides
/// reports the span of its ordered interpretation. For an empty view both
/// extremes collapse to `offset`. A valid view has a non-negative minimum;
/// the signed return lets constructors detect violations.
pub fn minmax_buffer_index(shape: &[usize], strides: &[isize], offset: usize) -> (isize, isize) {
    let mut min = offset as isize;
    let mut max = offset as isize;
    if numel(shape) == 0 {
        return (min, max);
    }
    for (&d, &s) in shape.iter().zip(strides) {
        let s = effective_stride(s, offset);
        let span = s * (d as isize - 1);
        if s > 0 {
            max += span;
        } else if s < 0 {
            min += span;
        }
    }
    (min, max)
}

/// Convert subscripts to a buffer offset.
///
/// Each subscript is resolved against its dimension by the per-dimension
/// modes, recycled modulo `submodes.len()` when fewer modes than dimensions
/// are given. Fails if any subscript is unresolvable.
pub fn sub_to_ind(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    subscripts: &[isize],
    submodes: &[IndexMode],
) -> Result<usize> {
    if subscripts.len() != shape.len() {
        return Err(ViewError::RankMismatch(shape.len(), subscripts.len()));
    }
    if submodes.is_empty() {
        return Err(ViewError::EmptySubmodes);
    }
    let mut ind = offset as isize;
    for (i, (&d, &s)) in shape.iter().zip(strides).enumerate() {
        if d == 0 {
            return Err(ViewError::OutOfBounds {
                idx: subscripts[i],
                max: 0,
            });
        }
        let mode = submodes[i % submodes.len()];
        let j = resolve_index(subscripts[i], d - 1, mode)? as isize;
        ind += j * effective_stride(s, offset);
    }
    Ok(ind as usize)
}

/// Convert a buffer offset to subscripts, the inverse of [`sub_to_ind`].
///
/// `idx` is first resolved against the number of view elements by `mode`.
/// For a zero-offset view the buffer index coincides with the view's
/// storage index and is decomposed directly by shape and order. Otherwise
/// the index is measured from the lowest reachable buffer position and
/// decomposed against the stride magnitudes, row-major from the first
/// dimension outward and column-major from the last; a dimension stored
/// backward yields its subscript reflected against the far end, so the
/// returned subscripts address the same buffer element through the signed
/// strides.
pub fn ind_to_sub(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    order: Order,
    idx: isize,
    mode: IndexMode,
) -> Result<Vec<usize>> {
    let n = shape.len();
    let len = numel(shape);
    if len == 0 {
        return Err(ViewError::OutOfBounds { idx, max: 0 });
    }
    let resolved = resolve_index(idx, len - 1, mode)?;
    let mut sub = vec![0usize; n];
    if n == 0 {
        return Ok(sub);
    }

    if offset == 0 {
        let mut v = resolved;
        match order {
            Order::RowMajor => {
                for i in (0..n).rev() {
                    sub[i] = v % shape[i];
                    v /= shape[i];
                }
            }
            Order::ColMajor => {
                for i in 0..n {
                    sub[i] = v % shape[i];
                    v /= shape[i];
                }
            }
        }
        return Ok(sub);
    }

    let (min, _) = minmax_buffer_index(shape, strides, offset);
    let mut r = resolved as isize - min;
    if r < 0 {
        return Err(ViewError::OutOfBounds { idx, max: len - 1 });
    }
    let dims: Box<dyn Iterator<Item = usize>> = match order {
        Order::RowMajor => Box::new(0..n),
        Order::ColMajor => Box::new((0..n).rev()),
    };
    for i in dims {
        let d = shape[i] as isize;
        let s = strides[i];
        let m = s.unsigned_abs() as isize;
        let k = if m == 0 { 0 } else { r / m };
        if k >= d {
            return Err(ViewError::OutOfBounds { idx, max: len - 1 });
        }
        r -= k * m;
        sub[i] = if s < 0 { (d - 1 - k) as usize } else { k as usize };
    }
    Ok(sub)
}

/// Convert a linear view index to a buffer offset.
///
/// The view is treated as a flat index space `[0, len)` enumerated in
/// `order`; `idx` is resolved against that space by `mode`, decomposed into
/// subscripts, and folded through the strides.
pub fn vind_to_bind(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    order: Order,
    idx: isize,
    mode: IndexMode,
) -> Result<usize> {
    let n = shape.len();
    let len = numel(shape);
    if len == 0 {
        return Err(ViewError::OutOfBounds { idx, max: 0 });
    }
    let mut v = resolve_index(idx, len - 1, mode)?;
    let mut ind = offset as isize;
    match order {
        Order::RowMajor => {
            for i in (0..n).rev() {
                let d = shape[i];
                let j = v % d;
                v /= d;
                ind += j as isize * effective_stride(strides[i], offset);
            }
        }
        Order::ColMajor => {
            for i in 0..n {
                let d = shape[i];
                let j = v % d;
                v /= d;
                ind += j as isize * effective_stride(strides[i], offset);
            }
        }
    }
    Ok(ind as usize)
}

/// Convert a buffer offset to a linear view index, the inverse of
/// [`vind_to_bind`] under [`IndexMode::Error`] for views with a positive
/// offset.
pub fn bind_to_vind(
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    order: Order,
    idx: isize,
    mode: IndexMode,
) -> Result<usize> {
    let sub = ind_to_sub(shape, strides, offset, order, idx, mode)?;
    let canonical = shape_to_strides(shape, order);
    let mut vind = 0isize;
    for (&j, &s) in sub.iter().zip(&canonical) {
        vind += j as isize * s;
    }
    Ok(vind as usize)
}
