//! Planar projective transforms and inverse-mapped image warping.
//!
//! A transform is the 3x3 matrix `H` with `h33 = 1`:
//!
//! ```text
//! [h11 h12 h13]   [x]   [wx']
//! [h21 h22 h23] * [y] = [wy']
//! [h31 h32 1  ]   [1]   [w  ]
//! ```
//!
//! Four point correspondences give eight equations for the eight unknowns.

use image::{ImageBuffer, Pixel};
use ndarray::{s, Array1, Array2};

use crate::error::{Result, TryOnError};

pub const WAIST_RATIO: f64 = 0.88;

/// Tolerance for sample coordinates that land a rounding error outside the
/// source image.
const EDGE_EPS: f64 = 1e-6;

pub type Quad = [(f64, f64); 4];

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveTransform {
    pub matrix: Array2<f64>,
}

impl PerspectiveTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Array2::eye(3),
        }
    }

    /// Solve for the transform mapping `src[i]` onto `dst[i]` exactly.
    pub fn from_quads(src: &Quad, dst: &Quad) -> Result<Self> {
        // Augmented system [A | b], 8 x 9
        let mut system = Array2::<f64>::zeros((8, 9));
        for (i, (&(x, y), &(u, v))) in src.iter().zip(dst.iter()).enumerate() {
            let row_u = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
            let row_v = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
            system.row_mut(i).assign(&Array1::from(row_u.to_vec()));
            system.row_mut(i + 4).assign(&Array1::from(row_v.to_vec()));
        }

        let h = solve_augmented(system).ok_or_else(|| {
            TryOnError::DegenerateGeometry(format!(
                "no projective mapping from {:?} to {:?}",
                src, dst
            ))
        })?;

        let mut matrix = Array2::<f64>::zeros((3, 3));
        for (i, value) in h.iter().enumerate() {
            matrix[[i / 3, i % 3]] = *value;
        }
        matrix[[2, 2]] = 1.0;

        Ok(Self { matrix })
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.matrix;
        let w = m[[2, 0]] * x + m[[2, 1]] * y + m[[2, 2]];
        let u = (m[[0, 0]] * x + m[[0, 1]] * y + m[[0, 2]]) / w;
        let v = (m[[1, 0]] * x + m[[1, 1]] * y + m[[1, 2]]) / w;
        (u, v)
    }

    pub fn inverse(&self) -> Result<Self> {
        let m = &self.matrix;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[[r0, c0]] * m[[r1, c1]] - m[[r0, c1]] * m[[r1, c0]]
        };

        let det = m[[0, 0]] * cof(1, 2, 1, 2) - m[[0, 1]] * cof(1, 2, 0, 2)
            + m[[0, 2]] * cof(1, 2, 0, 1);
        if det.abs() < 1e-12 {
            return Err(TryOnError::DegenerateGeometry(
                "perspective matrix is singular".to_string(),
            ));
        }

        // Adjugate (transposed cofactors) over the determinant
        let adj = [
            [cof(1, 2, 1, 2), -cof(0, 2, 1, 2), cof(0, 1, 1, 2)],
            [-cof(1, 2, 0, 2), cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
            [cof(1, 2, 0, 1), -cof(0, 2, 0, 1), cof(0, 1, 0, 1)],
        ];
        let mut inv = Array2::<f64>::zeros((3, 3));
        for r in 0..3 {
            for c in 0..3 {
                inv[[r, c]] = adj[r][c] / det;
            }
        }

        Ok(Self { matrix: inv })
    }
}

/// Gaussian elimination with partial pivoting. Returns `None` when the
/// system is singular (collinear or repeated points).
fn solve_augmented(mut a: Array2<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[[i, col]]
                .abs()
                .partial_cmp(&a[[j, col]].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[[pivot, col]].abs() < 1e-10 {
            return None;
        }
        if pivot != col {
            for k in 0..=n {
                a.swap([pivot, k], [col, k]);
            }
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                a[[row, k]] -= factor * a[[col, k]];
            }
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = a
            .slice(s![row, row + 1..n])
            .iter()
            .zip(x.slice(s![row + 1..n]).iter())
            .map(|(c, v)| c * v)
            .sum();
        x[row] = (a[[row, n]] - tail) / a[[row, row]];
    }

    Some(x)
}

/// Source and destination quads for the waist taper of a `w` x `h` garment:
/// the top edge stays put and the bottom edge narrows symmetrically to
/// `round(w * waist_ratio)`.
pub fn taper_quads(w: u32, h: u32, waist_ratio: f64) -> (Quad, Quad) {
    let bottom_width = (w as f64 * waist_ratio).round() as u32;
    let (wf, hf) = (w as f64, h as f64);
    let left = (w / 2) as f64 - (bottom_width / 2) as f64;
    let right = (w / 2 + bottom_width / 2) as f64;

    let src = [(0.0, 0.0), (wf, 0.0), (wf, hf), (0.0, hf)];
    let dst = [(0.0, 0.0), (wf, 0.0), (right, hf), (left, hf)];
    (src, dst)
}

/// Taper transform for a `w` x `h` garment. Regions too narrow for the
/// bottom corners to stay apart are left untapered.
pub fn taper_transform(w: u32, h: u32, waist_ratio: f64) -> Result<PerspectiveTransform> {
    if w == 0 || h == 0 {
        return Err(TryOnError::DegenerateGeometry(format!(
            "cannot warp a {}x{} region",
            w, h
        )));
    }
    let (src, dst) = taper_quads(w, h, waist_ratio);
    if dst[2].0 <= dst[3].0 {
        log::debug!("{}x{} region too narrow to taper", w, h);
        return Ok(PerspectiveTransform::identity());
    }
    PerspectiveTransform::from_quads(&src, &dst)
}

/// Warp `img` through `transform` into a `out_w` x `out_h` buffer.
///
/// Every output pixel is mapped back through the inverse transform and
/// sampled bilinearly; pixels whose source falls outside `img` stay zero.
pub fn warp_perspective<P>(
    img: &ImageBuffer<P, Vec<u8>>,
    transform: &PerspectiveTransform,
    out_w: u32,
    out_h: u32,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    let inverse = transform.inverse()?;
    let (img_w, img_h) = img.dimensions();
    let mut output = ImageBuffer::<P, Vec<u8>>::new(out_w, out_h);
    if img_w == 0 || img_h == 0 {
        return Ok(output);
    }

    let max_x = (img_w - 1) as f64;
    let max_y = (img_h - 1) as f64;
    let channels = P::CHANNEL_COUNT as usize;

    for out_y in 0..out_h {
        for out_x in 0..out_w {
            let (in_x, in_y) = inverse.apply(out_x as f64, out_y as f64);
            if !(in_x > -EDGE_EPS && in_x < img_w as f64 && in_y > -EDGE_EPS && in_y < img_h as f64)
            {
                continue;
            }
            let in_x = in_x.clamp(0.0, max_x);
            let in_y = in_y.clamp(0.0, max_y);

            let x0 = in_x.floor() as u32;
            let y0 = in_y.floor() as u32;
            let x1 = (x0 + 1).min(img_w - 1);
            let y1 = (y0 + 1).min(img_h - 1);

            let fx = in_x - x0 as f64;
            let fy = in_y - y0 as f64;

            let w00 = (1.0 - fx) * (1.0 - fy);
            let w10 = fx * (1.0 - fy);
            let w01 = (1.0 - fx) * fy;
            let w11 = fx * fy;

            let p00 = img.get_pixel(x0, y0).channels();
            let p10 = img.get_pixel(x1, y0).channels();
            let p01 = img.get_pixel(x0, y1).channels();
            let p11 = img.get_pixel(x1, y1).channels();

            let out = output.get_pixel_mut(out_x, out_y).channels_mut();
            for c in 0..channels {
                let v = p00[c] as f64 * w00
                    + p10[c] as f64 * w10
                    + p01[c] as f64 * w01
                    + p11[c] as f64 * w11;
                out[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6
    }

    #[test]
    fn solves_general_quad() {
        let src = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let dst = [(1.0, 2.0), (12.0, 1.0), (9.0, 13.0), (-1.0, 8.0)];
        let t = PerspectiveTransform::from_quads(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            assert!(close(t.apply(s.0, s.1), *d), "{:?} -> {:?}", s, d);
        }
    }

    #[test]
    fn inverse_round_trips() {
        let t = taper_transform(120, 90, WAIST_RATIO).unwrap();
        let inv = t.inverse().unwrap();
        for &(x, y) in &[(0.0, 0.0), (60.0, 45.0), (119.0, 89.0), (13.5, 70.25)] {
            let (u, v) = t.apply(x, y);
            assert!(close(inv.apply(u, v), (x, y)));
        }
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let src = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];
        let dst = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let err = PerspectiveTransform::from_quads(&src, &dst).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DegenerateGeometry);
    }

    #[test]
    fn zero_size_taper_is_degenerate() {
        assert!(taper_transform(0, 10, WAIST_RATIO).is_err());
        assert!(taper_transform(10, 0, WAIST_RATIO).is_err());
    }

    #[test]
    fn single_column_taper_is_identity() {
        let t = taper_transform(1, 130, WAIST_RATIO).unwrap();
        assert_eq!(t, PerspectiveTransform::identity());
        let img = GrayImage::from_pixel(1, 130, Luma([200]));
        assert_eq!(warp_perspective(&img, &t, 1, 130).unwrap(), img);
    }

    #[test]
    fn narrow_region_still_tapers() {
        let t = taper_transform(10, 10, WAIST_RATIO).unwrap();
        assert_ne!(t, PerspectiveTransform::identity());
    }

    #[test]
    fn identity_warp_preserves_pixels() {
        let src = [(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)];
        let t = PerspectiveTransform::from_quads(&src, &src).unwrap();
        let img = GrayImage::from_fn(4, 3, |x, y| Luma([(x * 10 + y) as u8]));
        let out = warp_perspective(&img, &t, 4, 3).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn taper_leaves_bottom_corners_empty() {
        let t = taper_transform(50, 40, WAIST_RATIO).unwrap();
        let img = GrayImage::from_pixel(50, 40, Luma([255]));
        let out = warp_perspective(&img, &t, 50, 40).unwrap();
        // narrowed bottom edge: corner columns map outside the source
        assert_eq!(out.get_pixel(0, 39)[0], 0);
        assert_eq!(out.get_pixel(49, 39)[0], 0);
        assert_eq!(out.get_pixel(25, 0)[0], 255);
        assert_eq!(out.get_pixel(25, 39)[0], 255);
    }
}
