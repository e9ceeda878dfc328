//! ORB-style feature extraction.
//!
//! # Algorithm
//!
//! 1. Build an image pyramid (scale factor 1.2 per level).
//! 2. Detect FAST-9 corners on every level, suppressing non-maxima in a
//!    3x3 neighbourhood.
//! 3. Rank corners from all levels by score and keep the strongest
//!    `max_features`.
//! 4. Orient each corner by its intensity centroid and compute a rotated
//!    BRIEF descriptor on a Gaussian-smoothed copy of its level.
//!
//! The result depends only on the pixels and the parameters.

use image::imageops::{self, FilterType};
use image::GrayImage;
use tracing::debug;

use super::pattern::brief_pattern;
use super::{Descriptor, DescriptorSet, Keypoint, DESCRIPTOR_BYTES};
use crate::config::{MatchConfig, DEFAULT_FAST_THRESHOLD, DEFAULT_PYRAMID_LEVELS};

/// Keypoints closer than this to a level border are discarded, so the
/// orientation disc and every rotated BRIEF test stay inside the image.
const EDGE_THRESHOLD: u32 = 19;

/// Radius of the disc used for the intensity centroid.
const HALF_PATCH: i32 = 15;

const SCALE_FACTOR: f32 = 1.2;

const BLUR_SIGMA: f32 = 2.0;

/// Bresenham circle of radius 3, clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous arc length required for a FAST-9 corner.
const ARC_LENGTH: usize = 9;

/// ORB feature extractor.
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    max_features: usize,
    fast_threshold: u8,
    pyramid_levels: u8,
}

struct PyramidLevel {
    image: GrayImage,
    scale: f32,
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    x: u32,
    y: u32,
    score: f32,
    octave: u8,
}

impl OrbExtractor {
    /// Create an extractor keeping at most `max_features` keypoints.
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            pyramid_levels: DEFAULT_PYRAMID_LEVELS,
        }
    }

    /// Create an extractor from the extraction fields of a run config.
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            max_features: config.max_features,
            fast_threshold: config.fast_threshold,
            pyramid_levels: config.pyramid_levels.max(1),
        }
    }

    /// Extract keypoints and descriptors from a grayscale image.
    ///
    /// An image without usable corners yields an empty set rather than an
    /// error; the matcher scores such images at 0.
    pub fn extract(&self, image: &GrayImage) -> DescriptorSet {
        let levels = self.build_pyramid(image);

        let mut corners: Vec<Corner> = levels
            .iter()
            .enumerate()
            .flat_map(|(octave, level)| {
                detect_fast(&level.image, self.fast_threshold)
                    .into_iter()
                    .map(move |(x, y, score)| Corner {
                        x,
                        y,
                        score,
                        octave: octave as u8,
                    })
            })
            .collect();

        corners.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.octave.cmp(&b.octave))
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        corners.truncate(self.max_features);

        // Smooth only the levels that still hold a keypoint.
        let mut smoothed: Vec<Option<GrayImage>> = vec![None; levels.len()];
        for corner in &corners {
            let slot = &mut smoothed[corner.octave as usize];
            if slot.is_none() {
                *slot = Some(imageops::blur(&levels[corner.octave as usize].image, BLUR_SIGMA));
            }
        }

        let features = corners.iter().filter_map(|corner| {
            let level = &levels[corner.octave as usize];
            let blurred = smoothed[corner.octave as usize].as_ref()?;
            let angle = intensity_centroid_angle(&level.image, corner.x, corner.y);
            let descriptor = rotated_brief(blurred, corner.x, corner.y, angle);
            let keypoint = Keypoint {
                x: corner.x as f32 * level.scale,
                y: corner.y as f32 * level.scale,
                angle,
                response: corner.score,
                octave: corner.octave,
            };
            Some((keypoint, descriptor))
        });

        let set = DescriptorSet::from_features(features);
        debug!(
            width = image.width(),
            height = image.height(),
            levels = levels.len(),
            keypoints = set.len(),
            "Extracted ORB features"
        );
        set
    }

    fn build_pyramid(&self, image: &GrayImage) -> Vec<PyramidLevel> {
        let min_side = 2 * EDGE_THRESHOLD + 1;
        let mut levels = vec![PyramidLevel {
            image: image.clone(),
            scale: 1.0,
        }];

        let mut scale = 1.0f32;
        for _ in 1..self.pyramid_levels {
            scale *= SCALE_FACTOR;
            let width = (image.width() as f32 / scale).round() as u32;
            let height = (image.height() as f32 / scale).round() as u32;
            if width < min_side || height < min_side {
                break;
            }
            levels.push(PyramidLevel {
                image: imageops::resize(image, width, height, FilterType::Triangle),
                scale,
            });
        }

        levels
    }
}

impl Default for OrbExtractor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_FEATURES)
    }
}

/// FAST-9 detection with 3x3 non-maximum suppression.
///
/// Returns `(x, y, score)` in row-major order.
fn detect_fast(image: &GrayImage, threshold: u8) -> Vec<(u32, u32, f32)> {
    let (width, height) = image.dimensions();
    if width < 2 * EDGE_THRESHOLD + 1 || height < 2 * EDGE_THRESHOLD + 1 {
        return Vec::new();
    }

    let stride = width as usize;
    let mut scores = vec![0.0f32; stride * height as usize];
    for y in EDGE_THRESHOLD..height - EDGE_THRESHOLD {
        for x in EDGE_THRESHOLD..width - EDGE_THRESHOLD {
            if let Some(score) = fast_score(image, x, y, threshold) {
                scores[y as usize * stride + x as usize] = score;
            }
        }
    }

    let mut corners = Vec::new();
    for y in EDGE_THRESHOLD..height - EDGE_THRESHOLD {
        for x in EDGE_THRESHOLD..width - EDGE_THRESHOLD {
            let idx = y as usize * stride + x as usize;
            let score = scores[idx];
            if score <= 0.0 {
                continue;
            }

            let mut is_max = true;
            'neighbours: for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let n = (idx as i64 + dy * stride as i64 + dx) as usize;
                    // Equal scores: the earlier pixel in row-major order wins.
                    if scores[n] > score || (scores[n] == score && n < idx) {
                        is_max = false;
                        break 'neighbours;
                    }
                }
            }

            if is_max {
                corners.push((x, y, score));
            }
        }
    }

    corners
}

/// Score of a FAST-9 corner at `(x, y)`, or `None` when it is not a corner.
fn fast_score(image: &GrayImage, x: u32, y: u32, threshold: u8) -> Option<f32> {
    let center = image.get_pixel(x, y)[0] as i32;
    let t = threshold as i32;

    let mut ring = [0i32; 16];
    for (value, &(dx, dy)) in ring.iter_mut().zip(CIRCLE.iter()) {
        *value = image.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i32;
    }

    // Any 9-pixel arc covers at least two of the four compass points.
    let compass = [ring[0], ring[4], ring[8], ring[12]];
    let bright_compass = compass.iter().filter(|&&p| p > center + t).count();
    let dark_compass = compass.iter().filter(|&&p| p < center - t).count();
    if bright_compass < 2 && dark_compass < 2 {
        return None;
    }

    let bright = longest_arc(&ring, |p| p > center + t);
    let dark = longest_arc(&ring, |p| p < center - t);
    if bright < ARC_LENGTH && dark < ARC_LENGTH {
        return None;
    }

    let bright_sum: i32 = ring
        .iter()
        .filter(|&&p| p > center + t)
        .map(|&p| p - center - t)
        .sum();
    let dark_sum: i32 = ring
        .iter()
        .filter(|&&p| p < center - t)
        .map(|&p| center - t - p)
        .sum();

    Some(bright_sum.max(dark_sum) as f32)
}

/// Longest run of ring pixels satisfying `pred`, wrapping around the circle.
fn longest_arc(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> usize {
    let mut best = 0;
    let mut run = 0;
    for i in 0..ring.len() * 2 {
        if pred(ring[i % ring.len()]) {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best.min(ring.len())
}

/// Orientation from the intensity centroid of a disc around `(x, y)`.
fn intensity_centroid_angle(image: &GrayImage, x: u32, y: u32) -> f32 {
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;

    for dy in -HALF_PATCH..=HALF_PATCH {
        for dx in -HALF_PATCH..=HALF_PATCH {
            if dx * dx + dy * dy > HALF_PATCH * HALF_PATCH {
                continue;
            }
            let (px, py) = ((x as i32 + dx) as u32, (y as i32 + dy) as u32);
            let intensity = image.get_pixel(px, py)[0] as f32;
            m10 += dx as f32 * intensity;
            m01 += dy as f32 * intensity;
        }
    }

    m01.atan2(m10)
}

/// Rotated BRIEF descriptor sampled on a smoothed level image.
fn rotated_brief(image: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
    let (cos_a, sin_a) = (angle.cos(), angle.sin());
    let max_x = image.width() as i32 - 1;
    let max_y = image.height() as i32 - 1;

    let sample = |px: i8, py: i8| -> u8 {
        let (px, py) = (px as f32, py as f32);
        let rx = (px * cos_a - py * sin_a).round() as i32;
        let ry = (px * sin_a + py * cos_a).round() as i32;
        let sx = (x as i32 + rx).clamp(0, max_x) as u32;
        let sy = (y as i32 + ry).clamp(0, max_y) as u32;
        image.get_pixel(sx, sy)[0]
    };

    let mut descriptor = [0u8; DESCRIPTOR_BYTES];
    for (bit, pair) in brief_pattern().iter().enumerate() {
        if sample(pair.x1, pair.y1) < sample(pair.x2, pair.y2) {
            descriptor[bit / 8] |= 1 << (bit % 8);
        }
    }
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{flat_image, textured_image};

    #[test]
    fn test_flat_image_has_no_keypoints() {
        let extractor = OrbExtractor::new(500);
        let set = extractor.extract(&flat_image(128, 128, 128));
        assert!(set.is_empty());
    }

    #[test]
    fn test_tiny_image_has_no_keypoints() {
        let extractor = OrbExtractor::new(500);
        assert!(extractor.extract(&GrayImage::new(0, 0)).is_empty());
        assert!(extractor.extract(&textured_image(20, 20, 1)).is_empty());
    }

    #[test]
    fn test_textured_image_has_keypoints() {
        let extractor = OrbExtractor::new(500);
        let set = extractor.extract(&textured_image(256, 256, 7));
        assert!(set.len() >= 50, "expected many corners, got {}", set.len());
        assert_eq!(set.keypoints().len(), set.descriptors().len());
    }

    #[test]
    fn test_max_features_caps_keypoints() {
        let image = textured_image(256, 256, 7);
        let set = OrbExtractor::new(25).extract(&image);
        assert_eq!(set.len(), 25);

        // Strongest first
        let responses: Vec<f32> = set.keypoints().iter().map(|k| k.response).collect();
        assert!(responses.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let image = textured_image(200, 160, 3);
        let extractor = OrbExtractor::new(300);
        let a = extractor.extract(&image);
        let b = extractor.extract(&image);
        assert_eq!(a.descriptors(), b.descriptors());
        assert_eq!(a.keypoints(), b.keypoints());
    }

    #[test]
    fn test_keypoints_inside_image() {
        let image = textured_image(240, 180, 11);
        let set = OrbExtractor::new(500).extract(&image);
        for kp in set.keypoints() {
            assert!(kp.x >= 0.0 && kp.x < 240.0);
            assert!(kp.y >= 0.0 && kp.y < 180.0);
        }
    }

    #[test]
    fn test_longest_arc_wraps() {
        let mut ring = [0i32; 16];
        for i in [12, 13, 14, 15, 0, 1, 2, 3, 4] {
            ring[i] = 100;
        }
        assert_eq!(longest_arc(&ring, |p| p > 50), 9);
        assert_eq!(longest_arc(&[100; 16], |p| p > 50), 16);
        assert_eq!(longest_arc(&[0; 16], |p| p > 50), 0);
    }

    #[test]
    fn test_single_bright_pixel_is_not_corner() {
        let mut image = flat_image(64, 64, 50);
        image.put_pixel(32, 32, image::Luma([250]));
        assert!(fast_score(&image, 32, 32, 20).is_none());
    }

    #[test]
    fn test_dark_pixel_on_bright_background_is_corner() {
        let mut image = flat_image(64, 64, 200);
        image.put_pixel(32, 32, image::Luma([20]));
        // Every ring pixel exceeds the center by 180, minus the threshold.
        assert_eq!(fast_score(&image, 32, 32, 20), Some(16.0 * 160.0));
        assert!(fast_score(&image, 20, 20, 20).is_none());
    }
}
