use fitrs_vision::composite::{self, Compositor, WarpParams, TRIM_RATIO};
use fitrs_vision::{ErrorKind, GarmentAsset, TorsoBox};
use image::{GrayImage, Luma, Rgb, RgbImage};

fn person(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn solid_garment(width: u32, height: u32, color: Rgb<u8>) -> GarmentAsset {
    GarmentAsset::new(
        RgbImage::from_pixel(width, height, color),
        GrayImage::from_pixel(width, height, Luma([255])),
    )
    .unwrap()
}

// The taper moves textured content toward the midline, so this only holds
// for a uniform garment over a uniform ROI.
#[test]
fn test_garment_matching_roi_is_identity() {
    env_logger::try_init().ok();
    let color = Rgb([90, 140, 200]);
    let person = RgbImage::from_pixel(600, 800, color);
    let garment = solid_garment(100, 130, color);

    let out = Compositor::default()
        .composite(&person, &garment, TorsoBox::new(250, 290, 350, 420))
        .unwrap();
    assert_eq!(out, person);
}

#[test]
fn test_empty_mask_leaves_person_untouched() {
    let mut img = person(600, 800);
    let before = img.clone();
    let garment = GarmentAsset::new(
        RgbImage::from_pixel(80, 80, Rgb([255, 0, 0])),
        GrayImage::new(80, 80),
    )
    .unwrap();

    let err = Compositor::default()
        .composite_in_place(&mut img, &garment, TorsoBox::new(250, 290, 350, 420))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyMask);
    assert_eq!(img, before);
}

#[test]
fn test_composite_only_touches_box() {
    let original = person(300, 300);
    let bbox = TorsoBox::new(100, 80, 200, 210);
    let out = Compositor::default()
        .composite(&original, &solid_garment(40, 40, Rgb([255, 0, 0])), bbox)
        .unwrap();

    for (x, y, p) in out.enumerate_pixels() {
        let inside = (100..200).contains(&x) && (80..210).contains(&y);
        if !inside {
            assert_eq!(p, original.get_pixel(x, y), "({}, {}) changed", x, y);
        }
    }
    // torso center is covered, trimmed edge columns are not
    assert_eq!(out.get_pixel(150, 100), &Rgb([255, 0, 0]));
    assert_eq!(out.get_pixel(101, 100), original.get_pixel(101, 100));
    assert_eq!(out.get_pixel(198, 100), original.get_pixel(198, 100));
}

#[test]
fn test_input_buffer_not_mutated_by_composite() {
    let original = person(120, 120);
    let copy = original.clone();
    let _ = Compositor::default()
        .composite(
            &original,
            &solid_garment(10, 10, Rgb([0, 0, 0])),
            TorsoBox::new(10, 10, 110, 110),
        )
        .unwrap();
    assert_eq!(original, copy);
}

#[test]
fn test_box_is_reclamped_to_current_image() {
    // box estimated on a larger frame
    let original = person(200, 150);
    let mut img = original.clone();
    let roi = Compositor::default()
        .composite_in_place(
            &mut img,
            &solid_garment(30, 30, Rgb([255, 255, 255])),
            TorsoBox::new(120, 60, 260, 240),
        )
        .unwrap();
    assert_eq!(roi, TorsoBox::new(120, 60, 200, 150));
    assert_ne!(img, original);

    let err = Compositor::default()
        .composite(
            &original,
            &solid_garment(30, 30, Rgb([255, 255, 255])),
            TorsoBox::new(-50, 10, -10, 40),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBox);
}

#[test]
fn test_box_reclamped_to_last_column_composites() {
    let original = person(600, 800);
    let red = Rgb([255, 0, 0]);
    let out = Compositor::default()
        .composite(&original, &solid_garment(40, 40, red), TorsoBox::new(599, 290, 700, 420))
        .unwrap();

    for y in 290..420 {
        assert_eq!(*out.get_pixel(599, y), red, "row {}", y);
        assert_eq!(out.get_pixel(598, y), original.get_pixel(598, y));
    }
    assert_eq!(out.get_pixel(599, 289), original.get_pixel(599, 289));
}

#[test]
fn test_tight_crop_ignores_padding() {
    // garment occupies the right half of a padded canvas; its left half is a
    // different color but fully transparent
    let image = RgbImage::from_fn(200, 100, |x, _| {
        if x >= 100 {
            Rgb([0, 255, 0])
        } else {
            Rgb([255, 0, 255])
        }
    });
    let mask = GrayImage::from_fn(200, 100, |x, _| Luma([if x >= 100 { 255 } else { 0 }]));
    let garment = GarmentAsset::new(image, mask).unwrap();

    let fitted = Compositor::default().fit_garment(&garment, 50, 60).unwrap();
    for (x, y, m) in fitted.mask.enumerate_pixels() {
        if m[0] == 255 {
            assert_eq!(fitted.image.get_pixel(x, y), &Rgb([0, 255, 0]));
        }
    }
}

#[test]
fn test_fitted_mask_is_binary_and_trimmed() {
    let garment = solid_garment(64, 64, Rgb([1, 2, 3]));
    let w = 200;
    let fitted = Compositor::default().fit_garment(&garment, w, 100).unwrap();
    let trim = (TRIM_RATIO * w as f64).round() as u32;

    for (x, _, m) in fitted.mask.enumerate_pixels() {
        assert!(m[0] == 0 || m[0] == 255);
        if x < trim || x >= w - trim {
            assert_eq!(m[0], 0);
        }
    }
    // top row, inside the trim band, is fully covered
    for x in trim..w - trim {
        assert_eq!(fitted.mask.get_pixel(x, 0)[0], 255);
    }
}

#[test]
fn test_wider_waist_ratio_changes_bottom_row() {
    let garment = solid_garment(64, 64, Rgb([1, 2, 3]));
    let narrow = Compositor::new(WarpParams {
        waist_ratio: 0.6,
        trim_ratio: 0.0,
        ..WarpParams::default()
    })
    .fit_garment(&garment, 100, 100)
    .unwrap();
    let straight = Compositor::new(WarpParams {
        waist_ratio: 1.0,
        trim_ratio: 0.0,
        ..WarpParams::default()
    })
    .fit_garment(&garment, 100, 100)
    .unwrap();

    let covered = |m: &GrayImage| (0..100).filter(|&x| m.get_pixel(x, 99)[0] == 255).count();
    assert_eq!(covered(&straight.mask), 100);
    assert!(covered(&narrow.mask) < 70);
}

#[test]
fn test_zero_sized_roi_is_degenerate() {
    let err = Compositor::default()
        .fit_garment(&solid_garment(4, 4, Rgb([0, 0, 0])), 0, 10)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DegenerateGeometry);
}

#[test]
fn test_trim_is_content_independent() {
    let mut mask = GrayImage::from_fn(50, 3, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
    let trim = composite::trim_sleeves(&mut mask, TRIM_RATIO);
    assert_eq!(trim, 4);
    for y in 0..3 {
        for x in (0..4).chain(46..50) {
            assert_eq!(mask.get_pixel(x, y)[0], 0);
        }
    }
}
