//! Strategy selection for bulk element-wise traversal.
//!
//! Given same-shaped views and a per-element callback, the dispatcher
//! reaches exactly one terminal action:
//!
//! 1. rank 0: invoke the callback once, no iteration machinery;
//! 2. any zero extent: succeed without iterating;
//! 3. rank 1: the single strided loop;
//! 4. exactly one non-singleton dimension: squeeze to temporary
//!    one-dimensional descriptors over the same buffers and use the single
//!    loop; a failed descriptor falls through instead of failing the call;
//! 5. every array uniformly oriented and sharing the declared order:
//!    flatten order-contiguous arrays to one dimension, otherwise use the
//!    specialized nested loops up to [`MAX_DIRECT_NDIMS`];
//! 6. shared order up to [`MAX_BLOCKED_NDIMS`]: cache-blocked tiles;
//! 7. otherwise: translate every linear view index through each array's
//!    own geometry. Always correct, always available, strictly slowest.
//!
//! Whichever action runs, the callback observes the same input/output
//! element pairing keyed by logical view index; selection only affects
//! speed. Arrays declaring different memory orders pair by each array's
//! own enumeration, which only the squeeze, one-dimensional, and generic
//! paths preserve, so those are the paths such arrays may take.

use crate::convert::numel;
use crate::kernel::{run_1d, run_2d, run_3d, run_blocked, run_nd};
use crate::mode::IndexMode;
use crate::order::{iteration_order, Order};
use crate::view::{validate_geometry, Flags, StridedView, StridedViewMut};
use crate::{convert, Result, ViewError};

/// Maximum rank served by the specialized nested-loop kernels.
pub const MAX_DIRECT_NDIMS: usize = 8;

/// Maximum rank served by the cache-blocked kernels.
pub const MAX_BLOCKED_NDIMS: usize = 6;

/// Traversal geometry of one participating array.
pub(crate) struct ArrayGeom {
    /// Strides with the zero-offset ordering rule applied.
    strides: Vec<isize>,
    /// Strides as declared, for index translation on the generic path.
    raw_strides: Vec<isize>,
    offset: usize,
    order: Order,
    mode: IndexMode,
    elem_size: usize,
    buf_len: usize,
    flags: Flags,
}

impl ArrayGeom {
    fn of<T>(v: &StridedView<'_, T>) -> Self {
        Self {
            strides: v.iter_strides(),
            raw_strides: v.strides().to_vec(),
            offset: v.offset(),
            order: v.order(),
            mode: v.index_mode(),
            elem_size: v.elem_size(),
            buf_len: v.buf_len(),
            flags: v.flags(),
        }
    }

    fn of_mut<T>(v: &StridedViewMut<'_, T>) -> Self {
        Self {
            strides: v.iter_strides(),
            raw_strides: v.strides().to_vec(),
            offset: v.offset(),
            order: v.order(),
            mode: v.index_mode(),
            elem_size: v.elem_size(),
            buf_len: v.buf_len(),
            flags: v.flags(),
        }
    }

    /// Order-contiguous: a single gapless run whose stride magnitudes
    /// follow the declared order, so buffer order equals view order.
    fn order_contiguous(&self) -> bool {
        match self.order {
            Order::RowMajor => self.flags.row_major_contiguous,
            Order::ColMajor => self.flags.col_major_contiguous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    Scalar,
    Empty,
    OneDim,
    Squeeze(usize),
    Flatten,
    DirectNd,
    Blocked,
    Generic,
}

/// Decide the terminal action for same-shaped arrays.
///
/// `no_squeeze` and `no_flatten` mask states whose temporary descriptors
/// failed to materialize, re-entering the ladder one state further down.
pub(crate) fn select(
    shape: &[usize],
    geoms: &[ArrayGeom],
    no_squeeze: bool,
    no_flatten: bool,
) -> Strategy {
    let ndims = shape.len();
    if ndims == 0 {
        return Strategy::Scalar;
    }
    if numel(shape) == 0 {
        return Strategy::Empty;
    }
    if ndims == 1 {
        return Strategy::OneDim;
    }

    if !no_squeeze {
        let singletons = shape.iter().filter(|&&d| d == 1).count();
        if singletons == ndims - 1 {
            if let Some(axis) = shape.iter().position(|&d| d != 1) {
                return Strategy::Squeeze(axis);
            }
        }
    }

    let same_order = geoms.windows(2).all(|w| w[0].order == w[1].order);
    let oriented = geoms.iter().all(|g| iteration_order(&g.strides) != 0);
    if same_order && oriented {
        if !no_flatten && geoms.iter().all(ArrayGeom::order_contiguous) {
            return Strategy::Flatten;
        }
        if ndims <= MAX_DIRECT_NDIMS {
            return Strategy::DirectNd;
        }
    }
    if same_order && ndims <= MAX_BLOCKED_NDIMS {
        return Strategy::Blocked;
    }
    Strategy::Generic
}

/// Build temporary one-dimensional descriptors selecting a single axis of
/// each array, validated against the original buffers.
fn axis_descriptors(len: usize, geoms: &[ArrayGeom], axis: usize) -> Result<Vec<isize>> {
    let mut inner = Vec::with_capacity(geoms.len());
    for g in geoms {
        let stride = g.strides[axis];
        validate_geometry(g.buf_len, &[len], &[stride], g.offset)?;
        inner.push(stride);
    }
    Ok(inner)
}

/// Build temporary flattened descriptors with unit-magnitude strides in
/// each array's walk direction.
fn flat_descriptors(len: usize, geoms: &[ArrayGeom]) -> Result<Vec<isize>> {
    let mut inner = Vec::with_capacity(geoms.len());
    for g in geoms {
        let io = iteration_order(&g.strides) as isize;
        validate_geometry(g.buf_len, &[len], &[io], g.offset)?;
        inner.push(io);
    }
    Ok(inner)
}

/// Reorder dimensions so index 0 varies fastest per the shared declared
/// order.
fn loop_order(shape: &[usize], geoms: &[ArrayGeom]) -> (Vec<usize>, Vec<Vec<isize>>) {
    match geoms[0].order {
        Order::RowMajor => (
            shape.iter().rev().copied().collect(),
            geoms
                .iter()
                .map(|g| g.strides.iter().rev().copied().collect())
                .collect(),
        ),
        Order::ColMajor => (
            shape.to_vec(),
            geoms.iter().map(|g| g.strides.clone()).collect(),
        ),
    }
}

/// Slow path: translate every linear view index through each array's own
/// order, strides, offset, and index mode.
fn run_generic<F>(shape: &[usize], geoms: &[ArrayGeom], f: &mut F) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let len = numel(shape);
    let zeros = vec![0isize; geoms.len()];
    let mut offsets = vec![0isize; geoms.len()];
    for i in 0..len {
        for (o, g) in offsets.iter_mut().zip(geoms) {
            let bind = convert::vind_to_bind(
                shape,
                &g.raw_strides,
                g.offset,
                g.order,
                i as isize,
                g.mode,
            )?;
            *o = bind as isize - g.offset as isize;
        }
        f(&offsets, 1, &zeros)?;
    }
    Ok(())
}

/// Run the selected strategy, falling through when a temporary descriptor
/// cannot be built.
fn traverse<F>(shape: &[usize], geoms: &[ArrayGeom], f: &mut F) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let mut no_squeeze = false;
    let mut no_flatten = false;
    loop {
        match select(shape, geoms, no_squeeze, no_flatten) {
            Strategy::Scalar => {
                let offsets = vec![0isize; geoms.len()];
                let strides = vec![0isize; geoms.len()];
                return f(&offsets, 1, &strides);
            }
            Strategy::Empty => return Ok(()),
            Strategy::OneDim => {
                let inner: Vec<isize> = geoms.iter().map(|g| g.strides[0]).collect();
                return run_1d(shape[0], &inner, f);
            }
            Strategy::Squeeze(axis) => match axis_descriptors(shape[axis], geoms, axis) {
                Ok(inner) => return run_1d(shape[axis], &inner, f),
                Err(_) => no_squeeze = true,
            },
            Strategy::Flatten => {
                let len = numel(shape);
                match flat_descriptors(len, geoms) {
                    Ok(inner) => return run_1d(len, &inner, f),
                    Err(_) => no_flatten = true,
                }
            }
            Strategy::DirectNd => {
                let (dims, strides) = loop_order(shape, geoms);
                let refs: Vec<&[isize]> = strides.iter().map(|s| s.as_slice()).collect();
                return match dims.len() {
                    2 => run_2d(&dims, &refs, f),
                    3 => run_3d(&dims, &refs, f),
                    _ => run_nd(&dims, &refs, f),
                };
            }
            Strategy::Blocked => {
                let refs: Vec<&[isize]> = geoms.iter().map(|g| g.strides.as_slice()).collect();
                let sizes: Vec<usize> = geoms.iter().map(|g| g.elem_size).collect();
                return run_blocked(shape, &refs, &sizes, f);
            }
            Strategy::Generic => return run_generic(shape, geoms, f),
        }
    }
}

/// Fill `out` by invoking a value-producing callback once per element.
///
/// The callback is opaque; no traversal order is guaranteed, only that it
/// runs exactly once per logical element.
pub fn nullary<T, F>(out: &mut StridedViewMut<'_, T>, mut f: F) -> Result<()>
where
    F: FnMut() -> T,
{
    let shape = out.shape().to_vec();
    let geoms = [ArrayGeom::of_mut(out)];
    let base = out.as_mut_ptr();
    let mut sink = |offsets: &[isize], len: usize, strides: &[isize]| -> Result<()> {
        let mut p = base.wrapping_offset(offsets[0]);
        for _ in 0..len {
            unsafe {
                *p = f();
            }
            p = p.wrapping_offset(strides[0]);
        }
        Ok(())
    };
    traverse(&shape, &geoms, &mut sink)
}

/// Map `x` element-wise onto the same-shaped `out`.
///
/// Shape or rank disagreement is an immediate error before any element is
/// visited. A bounds failure during traversal aborts the whole call;
/// elements already written stay written.
pub fn unary<T, U, F>(x: &StridedView<'_, T>, out: &mut StridedViewMut<'_, U>, mut f: F) -> Result<()>
where
    F: FnMut(&T) -> U,
{
    if x.ndim() != out.ndim() {
        return Err(ViewError::RankMismatch(x.ndim(), out.ndim()));
    }
    if x.shape() != out.shape() {
        return Err(ViewError::ShapeMismatch(
            x.shape().to_vec(),
            out.shape().to_vec(),
        ));
    }
    let shape = out.shape().to_vec();
    let geoms = [ArrayGeom::of(x), ArrayGeom::of_mut(out)];
    let xp = x.as_ptr();
    let yp = out.as_mut_ptr();
    let mut sink = |offsets: &[isize], len: usize, strides: &[isize]| -> Result<()> {
        let mut a = xp.wrapping_offset(offsets[0]);
        let mut b = yp.wrapping_offset(offsets[1]);
        for _ in 0..len {
            unsafe {
                *b = f(&*a);
            }
            a = a.wrapping_offset(strides[0]);
            b = b.wrapping_offset(strides[1]);
        }
        Ok(())
    };
    traverse(&shape, &geoms, &mut sink)
}
