// Transform — preprocessing pipeline applied to each decoded sample
//
// All image transforms treat `Sample::features` as `[C, H, W]` (channel-first,
// row-major). The standard episode pipeline is
//
//   Compose[Rotate(angle), Normalize(mean, std)]
//
// applied to grayscale pixels already scaled to [0, 1] by the image loader.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::Sample;

/// A transform applied to each sample before batching.
pub trait Transform: Send + Sync {
    /// Apply the transform to a sample, returning the modified sample.
    fn apply(&self, sample: Sample) -> Sample;
}

// Built-in transforms

/// Per-channel normalization: `(v - mean[c]) / std[c]`.
///
/// A single mean/std pair is broadcast to every channel.
#[derive(Debug, Clone)]
pub struct Normalize {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Normalize {
    /// Same mean/std for every channel.
    pub fn new(mean: f64, std: f64) -> Self {
        Self {
            mean: vec![mean],
            std: vec![std],
        }
    }

    /// One mean/std pair per channel.
    pub fn per_channel(mean: Vec<f64>, std: Vec<f64>) -> Self {
        assert_eq!(
            mean.len(),
            std.len(),
            "Normalize: {} means but {} stds",
            mean.len(),
            std.len()
        );
        Self { mean, std }
    }

    fn stats_for(&self, channel: usize) -> (f64, f64) {
        if self.mean.len() == 1 {
            (self.mean[0], self.std[0])
        } else {
            (self.mean[channel], self.std[channel])
        }
    }
}

impl Transform for Normalize {
    fn apply(&self, mut sample: Sample) -> Sample {
        let (c, plane) = match sample.chw() {
            Some((c, h, w)) => (c, h * w),
            None => (1, sample.features.len()),
        };
        for ch in 0..c {
            let (mean, std) = self.stats_for(ch);
            for v in &mut sample.features[ch * plane..(ch + 1) * plane] {
                *v = (*v - mean) / std;
            }
        }
        sample
    }
}

/// Rotation by a fixed angle in degrees, counter-clockwise.
///
/// The canvas keeps its size; pixels rotated in from outside the image are
/// filled with 0. Sampling is nearest-neighbour about the image centre, so
/// multiples of 90° on square images are exact permutations of the pixels.
#[derive(Debug, Clone, Copy)]
pub struct Rotate {
    pub degrees: f64,
}

/// The four rotations used to augment glyph classes.
pub const QUARTER_TURNS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

impl Rotate {
    pub fn new(degrees: f64) -> Self {
        Self { degrees }
    }

    /// A rotation drawn uniformly from [`QUARTER_TURNS`].
    pub fn random_quarter_turn<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let degrees = *QUARTER_TURNS.choose(rng).unwrap_or(&0.0);
        Self { degrees }
    }
}

// Coefficients are rounded so that quarter turns produce exact 0/±1 terms.
fn rounded(v: f64) -> f64 {
    (v * 1e15).round() / 1e15
}

impl Transform for Rotate {
    fn apply(&self, mut sample: Sample) -> Sample {
        let degrees = self.degrees.rem_euclid(360.0);
        if degrees == 0.0 {
            return sample;
        }
        let Some((c, h, w)) = sample.chw() else {
            return sample;
        };

        // Inverse mapping: for each output pixel centre find the source pixel.
        let theta = -degrees.to_radians();
        let (cos, sin) = (rounded(theta.cos()), rounded(theta.sin()));
        let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);

        let mut rotated = vec![0.0; c * h * w];
        for row in 0..h {
            for col in 0..w {
                let dx = col as f64 + 0.5 - cx;
                let dy = row as f64 + 0.5 - cy;
                let sx = (cos * dx + sin * dy + cx).floor();
                let sy = (-sin * dx + cos * dy + cy).floor();
                if sx < 0.0 || sy < 0.0 || sx >= w as f64 || sy >= h as f64 {
                    continue;
                }
                let (sx, sy) = (sx as usize, sy as usize);
                for ch in 0..c {
                    rotated[ch * h * w + row * w + col] = sample.features[ch * h * w + sy * w + sx];
                }
            }
        }
        sample.features = rotated;
        sample
    }
}

/// Chain multiple transforms.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// The episode preprocessing pipeline: rotate, then normalize.
    pub fn episode_pipeline(rotation: f64, mean: f64, std: f64) -> Self {
        Self::new(vec![
            Box::new(Rotate::new(rotation)),
            Box::new(Normalize::new(mean, std)),
        ])
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, mut sample: Sample) -> Sample {
        for t in &self.transforms {
            sample = t.apply(sample);
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_image_sample(c: usize, h: usize, w: usize) -> Sample {
        let n = c * h * w;
        Sample {
            features: (0..n).map(|i| i as f64).collect(),
            feature_shape: vec![c, h, w],
            label: 0,
        }
    }

    #[test]
    fn rotate_zero_is_identity() {
        let sample = make_image_sample(1, 3, 3);
        let out = Rotate::new(0.0).apply(sample.clone());
        assert_eq!(out, sample);
        let out = Rotate::new(360.0).apply(sample.clone());
        assert_eq!(out, sample);
    }

    #[test]
    fn rotate_quarter_turn_counter_clockwise() {
        // [0, 1]      [1, 3]
        // [2, 3]  ->  [0, 2]
        let out = Rotate::new(90.0).apply(make_image_sample(1, 2, 2));
        assert_eq!(out.features, vec![1.0, 3.0, 0.0, 2.0]);
    }

    #[test]
    fn rotate_half_turn_reverses() {
        let out = Rotate::new(180.0).apply(make_image_sample(1, 3, 3));
        let expected: Vec<f64> = (0..9).rev().map(|i| i as f64).collect();
        assert_eq!(out.features, expected);
    }

    #[test]
    fn rotate_four_quarter_turns_round_trip() {
        let sample = make_image_sample(1, 4, 4);
        let mut out = sample.clone();
        for _ in 0..4 {
            out = Rotate::new(90.0).apply(out);
        }
        assert_eq!(out, sample);
    }

    #[test]
    fn rotate_odd_angle_fills_corners_with_zero() {
        let mut sample = make_image_sample(1, 8, 8);
        for v in &mut sample.features {
            *v = 1.0;
        }
        let out = Rotate::new(45.0).apply(sample);
        assert_eq!(out.features[0], 0.0);
        // Centre survives.
        assert_eq!(out.features[4 * 8 + 4], 1.0);
    }

    #[test]
    fn random_quarter_turn_picks_known_angle() {
        let mut rng = episodic_core::rng::seeded(3);
        for _ in 0..20 {
            let r = Rotate::random_quarter_turn(&mut rng);
            assert!(QUARTER_TURNS.contains(&r.degrees));
        }
    }

    #[test]
    fn normalize_broadcasts_single_channel_stats() {
        let t = Normalize::new(0.5, 0.25);
        let sample = Sample {
            features: vec![0.5, 0.75, 0.0],
            feature_shape: vec![1, 1, 3],
            label: 2,
        };
        let out = t.apply(sample);
        assert!((out.features[0] - 0.0).abs() < 1e-12);
        assert!((out.features[1] - 1.0).abs() < 1e-12);
        assert!((out.features[2] - -2.0).abs() < 1e-12);
        assert_eq!(out.label, 2);
    }

    #[test]
    fn normalize_per_channel() {
        let t = Normalize::per_channel(vec![0.0, 1.0], vec![1.0, 2.0]);
        let sample = Sample {
            features: vec![1.0, 2.0, 3.0, 5.0],
            feature_shape: vec![2, 1, 2],
            label: 0,
        };
        let out = t.apply(sample);
        assert_eq!(out.features, vec![1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn compose_rotates_before_normalizing() {
        let t = Compose::episode_pipeline(90.0, 1.0, 2.0);
        assert_eq!(t.len(), 2);
        let out = t.apply(make_image_sample(1, 2, 2));
        // rotated [1, 3, 0, 2] then (v - 1) / 2
        assert_eq!(out.features, vec![0.0, 1.0, -0.5, 0.5]);
    }
}
