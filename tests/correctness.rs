use approx::assert_relative_eq;
use ndview::{
    bind_to_vind, copy_into, fill, numel, resolve_index, shape_to_strides, strides_to_offset,
    sub_to_ind, unary, vind_to_bind, IndexMode, Order, StridedView, StridedViewMut,
};
use num_complex::Complex64;
use num_traits::FromPrimitive;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn linear_fill<T: FromPrimitive>(len: usize) -> Vec<T> {
    (0..len).map(|i| T::from_usize(i).unwrap()).collect()
}

struct Geometry {
    strides: Vec<isize>,
    offset: usize,
    order: Order,
    buf_len: usize,
}

// Random view geometry over `shape`: canonical strides for a random order,
// optionally dilated (gapped) and with random per-dimension sign flips, the
// offset placed at the first logical element.
fn random_geometry(rng: &mut StdRng, shape: &[usize]) -> Geometry {
    let order = if rng.gen_bool(0.5) {
        Order::RowMajor
    } else {
        Order::ColMajor
    };
    let dilate: isize = if rng.gen_bool(0.3) { 2 } else { 1 };
    let mut strides: Vec<isize> = shape_to_strides(shape, order)
        .iter()
        .map(|s| s * dilate)
        .collect();
    for s in strides.iter_mut() {
        if rng.gen_bool(0.3) {
            *s = -*s;
        }
    }
    let offset = strides_to_offset(shape, &strides);
    let mut max = offset as isize;
    for (&d, &s) in shape.iter().zip(&strides) {
        if s > 0 {
            max += s * (d as isize - 1);
        }
    }
    Geometry {
        strides,
        offset,
        order,
        buf_len: max as usize + 1,
    }
}

// Reference traversal driven purely by the index converters: element `i` of
// the input view, enumerated in its own order, maps to element `i` of the
// output view.
fn reference_unary(
    shape: &[usize],
    gx: &Geometry,
    xbuf: &[f64],
    gy: &Geometry,
    ybuf: &mut [f64],
    f: impl Fn(f64) -> f64,
) {
    for i in 0..numel(shape) {
        let bx = vind_to_bind(
            shape,
            &gx.strides,
            gx.offset,
            gx.order,
            i as isize,
            IndexMode::Error,
        )
        .unwrap();
        let by = vind_to_bind(
            shape,
            &gy.strides,
            gy.offset,
            gy.order,
            i as isize,
            IndexMode::Error,
        )
        .unwrap();
        ybuf[by] = f(xbuf[bx]);
    }
}

fn run_unary_case(shape: &[usize], gx: &Geometry, gy: &Geometry, label: &str) {
    let f = |v: f64| v * 3.0 + 0.25;
    let xbuf: Vec<f64> = (0..gx.buf_len).map(|i| i as f64 * 0.5 + 1.0).collect();

    let mut want = vec![-1.0; gy.buf_len];
    reference_unary(shape, gx, &xbuf, gy, &mut want, f);

    let mut got = vec![-1.0; gy.buf_len];
    {
        let x = StridedView::new(
            &xbuf,
            shape.to_vec(),
            gx.strides.clone(),
            gx.offset,
            gx.order,
            IndexMode::Error,
            vec![IndexMode::Error],
        )
        .unwrap();
        let mut y = StridedViewMut::new(
            &mut got,
            shape.to_vec(),
            gy.strides.clone(),
            gy.offset,
            gy.order,
            IndexMode::Error,
            vec![IndexMode::Error],
        )
        .unwrap();
        unary(&x, &mut y, |v| f(*v)).unwrap();
    }

    assert_eq!(
        got, want,
        "{label}: shape {shape:?} x({:?}, {}, {:?}) y({:?}, {}, {:?})",
        gx.strides, gx.offset, gx.order, gy.strides, gy.offset, gy.order
    );
}

#[test]
fn test_strategy_equivalence_randomized() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for round in 0..300 {
        let rank = rng.gen_range(1..=5);
        let shape: Vec<usize> = (0..rank).map(|_| rng.gen_range(1..=4)).collect();
        let gx = random_geometry(&mut rng, &shape);
        let gy = random_geometry(&mut rng, &shape);
        run_unary_case(&shape, &gx, &gy, &format!("round {round}"));
    }
}

#[test]
fn test_squeeze_collapse_matches_reference() {
    // a 10-element contiguous vector embedded as [1, 1, 10]
    let shape = [1usize, 1, 10];
    let gx = Geometry {
        strides: vec![10, 10, 1],
        offset: 0,
        order: Order::RowMajor,
        buf_len: 10,
    };
    let gy = Geometry {
        strides: vec![10, 10, 1],
        offset: 0,
        order: Order::RowMajor,
        buf_len: 10,
    };
    run_unary_case(&shape, &gx, &gy, "squeeze");
}

#[test]
fn test_high_rank_traversal() {
    let shape = vec![2usize; 7];

    // gapped but uniformly oriented: the nested-loop path
    let gapped: Vec<isize> = shape_to_strides(&shape, Order::RowMajor)
        .iter()
        .map(|s| s * 2)
        .collect();
    let g = Geometry {
        strides: gapped.clone(),
        offset: 0,
        order: Order::RowMajor,
        buf_len: 256,
    };
    let gy = Geometry {
        strides: shape_to_strides(&shape, Order::RowMajor),
        offset: 0,
        order: Order::RowMajor,
        buf_len: 128,
    };
    run_unary_case(&shape, &g, &gy, "rank 7 gapped");

    // mixed signs past the blocked bound: the generic path
    let mut mixed = shape_to_strides(&shape, Order::RowMajor);
    mixed[3] = -mixed[3];
    let offset = strides_to_offset(&shape, &mixed);
    let g = Geometry {
        strides: mixed,
        offset,
        order: Order::RowMajor,
        buf_len: 128,
    };
    run_unary_case(&shape, &g, &gy, "rank 7 mixed signs");
}

#[test]
fn test_blocked_tiling_boundaries() {
    // one dimension larger than the tile edge, mixed stride signs
    let shape = [70usize, 5];
    let strides = vec![-5isize, 1];
    let offset = strides_to_offset(&shape, &strides);
    let gx = Geometry {
        strides,
        offset,
        order: Order::RowMajor,
        buf_len: 350,
    };
    let gy = Geometry {
        strides: vec![5, 1],
        offset: 0,
        order: Order::RowMajor,
        buf_len: 350,
    };
    run_unary_case(&shape, &gx, &gy, "blocked tiling");
}

#[test]
fn test_mixed_declared_orders() {
    // same stride pattern, different declared orders, forces the
    // index-translating path and pairs elements by each view's own
    // enumeration
    let src: Vec<f64> = linear_fill(6);
    let mut dst = vec![0.0; 6];
    let x = StridedView::contiguous(&src, vec![2, 3], Order::RowMajor).unwrap();
    let mut y = StridedViewMut::contiguous(&mut dst, vec![2, 3], Order::ColMajor).unwrap();
    unary(&x, &mut y, |v| *v).unwrap();

    // x enumerates rows first, y enumerates columns first
    let x = StridedView::contiguous(&src, vec![2, 3], Order::RowMajor).unwrap();
    let y = StridedView::contiguous(&dst, vec![2, 3], Order::ColMajor).unwrap();
    for i in 0..6 {
        assert_eq!(y.iget(i).unwrap(), x.iget(i).unwrap());
    }
}

#[test]
fn test_complex_elements() {
    let src: Vec<Complex64> = (0..8).map(|i| Complex64::new(i as f64, -(i as f64))).collect();
    let mut dst = vec![Complex64::new(0.0, 0.0); 8];
    let x = StridedView::new(
        &src,
        vec![2, 4],
        vec![-4, 1],
        4,
        Order::RowMajor,
        IndexMode::Error,
        vec![IndexMode::Error],
    )
    .unwrap();
    let mut y = StridedViewMut::contiguous(&mut dst, vec![2, 4], Order::RowMajor).unwrap();
    unary(&x, &mut y, |v| v.conj()).unwrap();

    // first logical row of x is the second buffer row
    assert_eq!(dst[0], Complex64::new(4.0, 4.0));
    assert_eq!(dst[3], Complex64::new(7.0, 7.0));
    assert_eq!(dst[4], Complex64::new(0.0, 0.0));
    assert_eq!(dst[7], Complex64::new(3.0, 3.0));
}

#[test]
fn test_fill_and_copy() {
    let mut a = vec![0.0f64; 12];
    let mut av = StridedViewMut::contiguous(&mut a, vec![3, 4], Order::ColMajor).unwrap();
    fill(&mut av, 2.5).unwrap();

    let mut b = vec![0.0f64; 12];
    let x = StridedView::contiguous(&a, vec![3, 4], Order::ColMajor).unwrap();
    let mut y = StridedViewMut::contiguous(&mut b, vec![3, 4], Order::RowMajor).unwrap();
    copy_into(&mut y, &x).unwrap();

    for &v in &b {
        assert_relative_eq!(v, 2.5, epsilon = 1e-12);
    }
}

#[test]
fn test_index_arithmetic_scenarios() {
    assert_eq!(
        vind_to_bind(&[3, 3], &[-3, 1], 6, Order::RowMajor, 1, IndexMode::Error).unwrap(),
        7
    );
    assert_eq!(
        bind_to_vind(&[3, 3], &[-3, 1], 6, Order::RowMajor, 7, IndexMode::Error).unwrap(),
        1
    );
    assert_eq!(
        sub_to_ind(&[3, 3, 3], &[9, 3, 1], 0, &[1, 2, 2], &[IndexMode::Error]).unwrap(),
        17
    );
    assert_eq!(
        shape_to_strides(&[2, 3, 10], Order::RowMajor),
        vec![30, 10, 1]
    );
    assert_eq!(resolve_index(10, 8, IndexMode::Clamp).unwrap(), 8);
    assert_eq!(resolve_index(13, 10, IndexMode::Wrap).unwrap(), 2);
    assert!(resolve_index(10, 8, IndexMode::Error).is_err());
}

#[test]
fn test_empty_and_scalar_edges() {
    let src: Vec<f64> = vec![];
    let mut dst: Vec<f64> = vec![];
    let x = StridedView::contiguous(&src, vec![3, 0], Order::RowMajor).unwrap();
    let mut y = StridedViewMut::contiguous(&mut dst, vec![3, 0], Order::RowMajor).unwrap();
    unary(&x, &mut y, |v| v + 1.0).unwrap();

    let src = vec![41.0];
    let mut dst = vec![0.0];
    let x = StridedView::contiguous(&src, vec![], Order::ColMajor).unwrap();
    let mut y = StridedViewMut::contiguous(&mut dst, vec![], Order::ColMajor).unwrap();
    unary(&x, &mut y, |v| v + 1.0).unwrap();
    assert_eq!(dst[0], 42.0);
}
