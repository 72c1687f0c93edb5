//! Inner-block iteration engine shared by the dispatch strategies.
//!
//! Every traversal funnels into a sink callback receiving
//! `(offsets, len, inner_strides)`: per-array element offsets relative to
//! each array's first logical element, followed by `len` elements stepping
//! by the per-array inner strides. The entry points in `dispatch` implement
//! the sink with raw pointer walks; the machinery here only does offset
//! bookkeeping, so it is rank-generic and arity-generic at once.
//!
//! Kernels taking `dims` expect loop order: index 0 is the fastest-varying
//! dimension. Offsets are advanced incrementally per loop level and
//! restored on the way out, never recomputed from subscripts.

use crate::{Result, BLOCK_SIZE_IN_BYTES, BLOCK_SIZE_IN_ELEMENTS};

/// Run a single strided sequence of `len` elements.
pub(crate) fn run_1d<F>(len: usize, inner_strides: &[isize], f: &mut F) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let offsets = vec![0isize; inner_strides.len()];
    f(&offsets, len, inner_strides)
}

/// Unrolled two-dimensional nested loop.
pub(crate) fn run_2d<F>(dims: &[usize], strides_list: &[&[isize]], f: &mut F) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let inner: Vec<isize> = strides_list.iter().map(|s| s[0]).collect();
    let mut offsets = vec![0isize; strides_list.len()];
    for _ in 0..dims[1] {
        f(&offsets, dims[0], &inner)?;
        for (o, s) in offsets.iter_mut().zip(strides_list) {
            *o += s[1];
        }
    }
    Ok(())
}

/// Unrolled three-dimensional nested loop.
pub(crate) fn run_3d<F>(dims: &[usize], strides_list: &[&[isize]], f: &mut F) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let inner: Vec<isize> = strides_list.iter().map(|s| s[0]).collect();
    let mut offsets = vec![0isize; strides_list.len()];
    for _ in 0..dims[2] {
        for _ in 0..dims[1] {
            f(&offsets, dims[0], &inner)?;
            for (o, s) in offsets.iter_mut().zip(strides_list) {
                *o += s[1];
            }
        }
        for (o, s) in offsets.iter_mut().zip(strides_list) {
            *o -= dims[1] as isize * s[1];
            *o += s[2];
        }
    }
    Ok(())
}

/// Rank-generic nested loop via a recursive level handler.
pub(crate) fn run_nd<F>(dims: &[usize], strides_list: &[&[isize]], f: &mut F) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let inner: Vec<isize> = strides_list.iter().map(|s| s[0]).collect();
    let mut offsets = vec![0isize; strides_list.len()];
    nd_level(dims.len() - 1, dims, strides_list, &inner, &mut offsets, f)
}

/// `level` counts down from the slowest dimension to 0, where the sink
/// covers the fastest dimension in one call.
fn nd_level<F>(
    level: usize,
    dims: &[usize],
    strides_list: &[&[isize]],
    inner: &[isize],
    offsets: &mut [isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    if level == 0 {
        return f(offsets, dims[0], inner);
    }
    for _ in 0..dims[level] {
        nd_level(level - 1, dims, strides_list, inner, offsets, f)?;
        for (o, s) in offsets.iter_mut().zip(strides_list) {
            *o += s[level];
        }
    }
    for (o, s) in offsets.iter_mut().zip(strides_list) {
        *o -= dims[level] as isize * s[level];
    }
    Ok(())
}

/// Cache-blocked traversal.
///
/// Dimensions are sorted by ascending stride magnitude of the first array
/// using a stable insertion sort that simultaneously permutes a
/// dimension-index array, so every array's shape and strides are reordered
/// consistently. The space is then walked in tiles whose per-dimension edge
/// approximates a fixed byte budget, with tile base offsets accumulated
/// across nesting levels.
pub(crate) fn run_blocked<F>(
    shape: &[usize],
    strides_list: &[&[isize]],
    elem_sizes: &[usize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let rank = shape.len();

    let mut key: Vec<isize> = strides_list[0].to_vec();
    let mut perm: Vec<usize> = (0..rank).collect();
    for i in 1..rank {
        let k = key[i];
        let d = perm[i];
        let mut j = i;
        while j > 0 && key[j - 1].unsigned_abs() > k.unsigned_abs() {
            key[j] = key[j - 1];
            perm[j] = perm[j - 1];
            j -= 1;
        }
        key[j] = k;
        perm[j] = d;
    }

    let dims: Vec<usize> = perm.iter().map(|&i| shape[i]).collect();
    let ordered: Vec<Vec<isize>> = strides_list
        .iter()
        .map(|s| perm.iter().map(|&i| s[i]).collect())
        .collect();
    let inner: Vec<isize> = ordered.iter().map(|s| s[0]).collect();

    let bsize = match elem_sizes.iter().copied().max() {
        Some(m) if m > 0 => (BLOCK_SIZE_IN_BYTES / m).max(1),
        _ => BLOCK_SIZE_IN_ELEMENTS,
    };

    let mut offsets = vec![0isize; strides_list.len()];
    let mut tile = vec![0usize; rank];
    block_level(
        rank - 1,
        &dims,
        &ordered,
        bsize,
        &mut tile,
        &mut offsets,
        &inner,
        f,
    )
}

/// Walk tile origins along `level`, then recurse; once every dimension has
/// a tile extent, run the element loops within the tile.
#[allow(clippy::too_many_arguments)]
fn block_level<F>(
    level: usize,
    dims: &[usize],
    strides_list: &[Vec<isize>],
    bsize: usize,
    tile: &mut [usize],
    offsets: &mut [isize],
    inner: &[isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    let d = dims[level];
    let mut j = 0usize;
    while j < d {
        let extent = bsize.min(d - j);
        tile[level] = extent;
        if level == 0 {
            elem_level(dims.len() - 1, tile, strides_list, offsets, inner, f)?;
        } else {
            block_level(level - 1, dims, strides_list, bsize, tile, offsets, inner, f)?;
        }
        for (o, s) in offsets.iter_mut().zip(strides_list) {
            *o += extent as isize * s[level];
        }
        j += extent;
    }
    for (o, s) in offsets.iter_mut().zip(strides_list) {
        *o -= d as isize * s[level];
    }
    Ok(())
}

/// Element loops within one tile, fastest dimension innermost.
fn elem_level<F>(
    level: usize,
    tile: &[usize],
    strides_list: &[Vec<isize>],
    offsets: &mut [isize],
    inner: &[isize],
    f: &mut F,
) -> Result<()>
where
    F: FnMut(&[isize], usize, &[isize]) -> Result<()>,
{
    if level == 0 {
        return f(offsets, tile[0], inner);
    }
    for _ in 0..tile[level] {
        elem_level(level - 1, tile, strides_list, offsets, inner, f)?;
        for (o, s) in offsets.iter_mut().zip(strides_list) {
            *o += s[level];
        }
    }
    for (o, s) in offsets.iter_mut().zip(strides_list) {
        *o -= tile[level] as isize * s[level];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Expand one sink invocation into per-array element offsets.
    fn expand(offsets: &[isize], len: usize, strides: &[isize], seen: &mut Vec<Vec<isize>>) {
        for i in 0..len {
            seen.push(
                offsets
                    .iter()
                    .zip(strides)
                    .map(|(&o, &s)| o + i as isize * s)
                    .collect(),
            );
        }
    }

    #[test]
    fn test_run_1d() {
        let mut seen = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut seen);
            Ok(())
        };
        run_1d(4, &[2, -1], &mut sink).unwrap();
        drop(sink);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], vec![0, 0]);
        assert_eq!(seen[3], vec![6, -3]);
    }

    #[test]
    fn test_run_2d_matches_subscripts() {
        // dims in loop order: 3 fast, 2 slow
        let s0: Vec<isize> = vec![1, 3];
        let s1: Vec<isize> = vec![2, -6];
        let refs: Vec<&[isize]> = vec![&s0, &s1];
        let mut seen = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut seen);
            Ok(())
        };
        run_2d(&[3, 2], &refs, &mut sink).unwrap();
        drop(sink);
        assert_eq!(seen.len(), 6);
        let mut expected = Vec::new();
        for j1 in 0..2isize {
            for j0 in 0..3isize {
                expected.push(vec![j0 + 3 * j1, 2 * j0 - 6 * j1]);
            }
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_run_3d_visits_each_offset_once() {
        let s0: Vec<isize> = vec![1, 4, 8];
        let refs: Vec<&[isize]> = vec![&s0];
        let mut seen = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut seen);
            Ok(())
        };
        run_3d(&[4, 2, 3], &refs, &mut sink).unwrap();
        drop(sink);
        assert_eq!(seen.len(), 24);
        let mut flat: Vec<isize> = seen.iter().map(|v| v[0]).collect();
        flat.sort_unstable();
        flat.dedup();
        assert_eq!(flat.len(), 24);
    }

    #[test]
    fn test_run_nd_equals_run_3d() {
        let s0: Vec<isize> = vec![1, 5, 20];
        let s1: Vec<isize> = vec![-2, 10, 40];
        let refs: Vec<&[isize]> = vec![&s0, &s1];
        let dims = [5usize, 4, 2];

        let mut a = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut a);
            Ok(())
        };
        run_3d(&dims, &refs, &mut sink).unwrap();
        drop(sink);

        let mut b = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut b);
            Ok(())
        };
        run_nd(&dims, &refs, &mut sink).unwrap();
        drop(sink);

        assert_eq!(a, b);
    }

    #[test]
    fn test_run_blocked_covers_all_elements() {
        // element offsets must match the plain nested loop as a set
        let shape = [5usize, 7, 3];
        let s0: Vec<isize> = vec![21, 3, 1];
        let s1: Vec<isize> = vec![1, 5, 35];
        let refs: Vec<&[isize]> = vec![&s0, &s1];

        let mut blocked = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut blocked);
            Ok(())
        };
        run_blocked(&shape, &refs, &[8, 8], &mut sink).unwrap();
        drop(sink);

        // reference: plain nested loop, fastest dimension first
        let r0: Vec<isize> = s0.iter().rev().copied().collect();
        let r1: Vec<isize> = s1.iter().rev().copied().collect();
        let rrefs: Vec<&[isize]> = vec![&r0, &r1];
        let rdims: Vec<usize> = shape.iter().rev().copied().collect();
        let mut plain = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut plain);
            Ok(())
        };
        run_nd(&rdims, &rrefs, &mut sink).unwrap();
        drop(sink);

        blocked.sort();
        plain.sort();
        assert_eq!(blocked, plain);
    }

    #[test]
    fn test_run_blocked_tiles_large_dim() {
        // a dimension larger than the tile edge is split but still covered
        let shape = [70usize, 3];
        let s0: Vec<isize> = vec![3, 1];
        let refs: Vec<&[isize]> = vec![&s0];
        let mut seen = Vec::new();
        let mut sink = |o: &[isize], l: usize, s: &[isize]| {
            expand(o, l, s, &mut seen);
            Ok(())
        };
        run_blocked(&shape, &refs, &[8], &mut sink).unwrap();
        drop(sink);
        assert_eq!(seen.len(), 210);
        let mut flat: Vec<isize> = seen.iter().map(|v| v[0]).collect();
        flat.sort_unstable();
        flat.dedup();
        assert_eq!(flat.len(), 210);
    }
}
