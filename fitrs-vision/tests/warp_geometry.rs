use fitrs_vision::warp::{self, PerspectiveTransform, WAIST_RATIO};

fn assert_maps(t: &PerspectiveTransform, from: (f64, f64), to: (f64, f64)) {
    let (u, v) = t.apply(from.0, from.1);
    assert!(
        (u - to.0).abs() < 1e-6 && (v - to.1).abs() < 1e-6,
        "{:?} mapped to ({}, {}), expected {:?}",
        from,
        u,
        v,
        to
    );
}

#[test]
fn test_top_edge_is_fixed() {
    for &(w, h) in &[(2, 2), (7, 3), (100, 130), (200, 260), (641, 17)] {
        let t = warp::taper_transform(w, h, WAIST_RATIO).unwrap();
        assert_maps(&t, (0.0, 0.0), (0.0, 0.0));
        assert_maps(&t, (w as f64, 0.0), (w as f64, 0.0));
    }
}

#[test]
fn test_bottom_edge_narrows_symmetrically() {
    let (src, dst) = warp::taper_quads(200, 260, WAIST_RATIO);
    assert_eq!(src[2], (200.0, 260.0));
    assert_eq!(src[3], (0.0, 260.0));
    assert_eq!(dst[2], (188.0, 260.0));
    assert_eq!(dst[3], (12.0, 260.0));

    let t = PerspectiveTransform::from_quads(&src, &dst).unwrap();
    assert_maps(&t, (200.0, 260.0), (188.0, 260.0));
    assert_maps(&t, (0.0, 260.0), (12.0, 260.0));
}

#[test]
fn test_vertical_midline_is_preserved() {
    let t = warp::taper_transform(200, 100, WAIST_RATIO).unwrap();
    for y in [0.0, 25.0, 50.0, 99.0] {
        let (u, _) = t.apply(100.0, y);
        assert!((u - 100.0).abs() < 1e-6, "midline drifted to {} at y={}", u, y);
    }
}

#[test]
fn test_rows_only_shrink() {
    let t = warp::taper_transform(120, 80, WAIST_RATIO).unwrap();
    let mut prev_width = f64::MAX;
    for y in (0..=80).step_by(10) {
        let (l, _) = t.apply(0.0, y as f64);
        let (r, _) = t.apply(120.0, y as f64);
        let width = r - l;
        assert!(width <= prev_width + 1e-9);
        assert!(width <= 120.0 + 1e-9);
        prev_width = width;
    }
}
