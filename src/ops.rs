//! Convenience operations built on the dispatcher.

use crate::dispatch::{nullary, unary};
use crate::view::{StridedView, StridedViewMut};
use crate::Result;

/// Set every element of `out` to `value`.
pub fn fill<T: Clone>(out: &mut StridedViewMut<'_, T>, value: T) -> Result<()> {
    nullary(out, || value.clone())
}

/// Copy `x` element-wise into the same-shaped `out`.
pub fn copy_into<T: Clone>(out: &mut StridedViewMut<'_, T>, x: &StridedView<'_, T>) -> Result<()> {
    unary(x, out, |v| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndexMode, Order};

    #[test]
    fn test_fill() {
        let mut data = vec![0i32; 12];
        let mut out = StridedViewMut::contiguous(&mut data, vec![3, 4], Order::RowMajor).unwrap();
        fill(&mut out, 7).unwrap();
        assert!(data.iter().all(|&v| v == 7));
    }

    #[test]
    fn test_copy_into_reversed() {
        let src = vec![1u8, 2, 3, 4, 5];
        let mut dst = vec![0u8; 5];
        let x = StridedView::new(
            &src,
            vec![5],
            vec![-1],
            4,
            Order::RowMajor,
            IndexMode::Error,
            vec![IndexMode::Error],
        )
        .unwrap();
        let mut out = StridedViewMut::contiguous(&mut dst, vec![5], Order::RowMajor).unwrap();
        copy_into(&mut out, &x).unwrap();
        assert_eq!(dst, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_copy_into_transposed_strides() {
        // column-canonical strides under a column-major declaration
        let src: Vec<f64> = (0..6).map(|v| v as f64).collect();
        let mut dst = vec![0.0; 6];
        let x = StridedView::contiguous(&src, vec![2, 3], Order::ColMajor).unwrap();
        let mut out = StridedViewMut::contiguous(&mut dst, vec![2, 3], Order::ColMajor).unwrap();
        copy_into(&mut out, &x).unwrap();
        assert_eq!(dst, src);
    }
}
