//! Keypoint descriptors.
//!
//! A [`DescriptorSet`] is the only thing the pair matcher ever sees of an
//! image: an ordered list of keypoints, each with a 256-bit binary
//! descriptor compared by Hamming distance.
//!
//! # Components
//!
//! - **ORB extraction**: FAST corners over an image pyramid, oriented by
//!   intensity centroid and described with rotated BRIEF.

pub mod orb;
mod pattern;

pub use orb::OrbExtractor;

use serde::{Deserialize, Serialize};

/// Descriptor size in bytes (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// Packed 256-bit binary descriptor.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// A detected keypoint, in level-0 (full resolution) pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians
    pub angle: f32,
    /// FAST corner score, larger is stronger
    pub response: f32,
    /// Pyramid level the keypoint was detected on
    pub octave: u8,
}

/// Ordered keypoints with their descriptors for one image.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    /// Build a set from (keypoint, descriptor) pairs, keeping their order.
    pub fn from_features(features: impl IntoIterator<Item = (Keypoint, Descriptor)>) -> Self {
        let (keypoints, descriptors) = features.into_iter().unzip();
        Self {
            keypoints,
            descriptors,
        }
    }

    /// An empty set, as produced for an image with no usable keypoints.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }
}

/// Number of differing bits between two descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}
