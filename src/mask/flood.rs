//! Fixed-range flood fill over a 3-channel image.

use image::{GrayImage, RgbImage};
use std::collections::VecDeque;

/// Grow a 4-connected region from `seed`, accepting pixels whose channels
/// all lie within `tolerance` of the *seed* pixel (fixed-range mode: the
/// reference never drifts with the fill front, keeping the result
/// deterministic and bounded).
///
/// The fill writes into a scratch mask 2 px larger in each dimension than
/// the source (1 px border on every side); the interior is extracted before
/// returning, so the result has the source dimensions. The caller must have
/// bounds-checked `seed`.
pub(crate) fn flood_fill_region(
    image: &RgbImage,
    seed: (u32, u32),
    tolerance: u8,
) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut scratch = GrayImage::new(width + 2, height + 2);

    let reference = image.get_pixel(seed.0, seed.1).0;
    let tol = tolerance as i16;
    let within = |p: &[u8; 3]| {
        (0..3).all(|c| (p[c] as i16 - reference[c] as i16).abs() <= tol)
    };

    let mut queue = VecDeque::new();
    queue.push_back(seed);
    scratch.get_pixel_mut(seed.0 + 1, seed.1 + 1).0[0] = 255;

    while let Some((x, y)) = queue.pop_front() {
        let mut visit = |nx: u32, ny: u32| {
            let marked = &mut scratch.get_pixel_mut(nx + 1, ny + 1).0[0];
            if *marked == 0 && within(&image.get_pixel(nx, ny).0) {
                *marked = 255;
                queue.push_back((nx, ny));
            }
        };
        if x > 0 {
            visit(x - 1, y);
        }
        if x + 1 < width {
            visit(x + 1, y);
        }
        if y > 0 {
            visit(x, y - 1);
        }
        if y + 1 < height {
            visit(x, y + 1);
        }
    }

    // Extract the interior; the border stays untouched by construction.
    GrayImage::from_fn(width, height, |x, y| {
        *scratch.get_pixel(x + 1, y + 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_uniform_image_fills_completely() {
        let image = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        let region = flood_fill_region(&image, (5, 5), 20);
        assert!(region.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_fill_stops_at_contrast_edge() {
        // Left half dark, right half bright; tolerance 20 cannot cross.
        let image = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgb([40, 40, 40])
            } else {
                Rgb([200, 200, 200])
            }
        });
        let region = flood_fill_region(&image, (2, 2), 20);
        for (x, _, p) in region.enumerate_pixels() {
            assert_eq!(p.0[0], if x < 5 { 255 } else { 0 });
        }
    }

    #[test]
    fn test_fixed_range_does_not_chain_through_gradient() {
        // A horizontal ramp climbing 10 per column: neighbor-relative fill
        // would walk the whole ramp, seed-relative fill must stop once the
        // pixel differs from the *seed* by more than the tolerance.
        let image = RgbImage::from_fn(10, 1, |x, _| {
            let v = (x * 10) as u8;
            Rgb([v, v, v])
        });
        let region = flood_fill_region(&image, (0, 0), 20);
        for (x, _, p) in region.enumerate_pixels() {
            assert_eq!(p.0[0], if x <= 2 { 255 } else { 0 }, "column {x}");
        }
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        // Two same-colored squares touching only at a corner: 4-connectivity
        // must not leak across the diagonal.
        let image = RgbImage::from_fn(4, 4, |x, y| {
            let in_squares = (x < 2 && y < 2) || (x >= 2 && y >= 2);
            if in_squares {
                Rgb([100, 100, 100])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let region = flood_fill_region(&image, (0, 0), 10);
        assert_eq!(region.get_pixel(0, 0).0[0], 255);
        assert_eq!(region.get_pixel(1, 1).0[0], 255);
        assert_eq!(region.get_pixel(2, 2).0[0], 0);
        assert_eq!(region.get_pixel(3, 3).0[0], 0);
    }
}
