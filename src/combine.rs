use image::RgbImage;
use serde::Deserialize;

use crate::error::CombineError;

/// How a group of frames is collapsed into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMethod {
    /// Every frame contributes equally.
    Mean,
    /// Exponential weighting, newest frame heaviest.
    Weighted,
}

/// Collapses a group of same-sized frames into a single averaged frame.
#[derive(Debug, Clone)]
pub struct FrameCombiner {
    method: CombineMethod,
    alpha: f32,
}

impl FrameCombiner {
    pub fn new(method: CombineMethod, alpha: f32) -> Self {
        Self { method, alpha }
    }

    /// Combines `frames` (ordered oldest to newest) into one frame.
    ///
    /// A single-frame group is returned unchanged, so a group size of one
    /// leaves the stream untouched by averaging.
    pub fn combine(&self, frames: &[RgbImage]) -> Result<RgbImage, CombineError> {
        let first = frames.first().ok_or(CombineError::EmptyInput)?;
        let (width, height) = first.dimensions();
        for frame in frames {
            if frame.dimensions() != (width, height) {
                return Err(CombineError::ShapeMismatch {
                    width,
                    height,
                    got_width: frame.width(),
                    got_height: frame.height(),
                });
            }
        }

        if frames.len() == 1 {
            return Ok(first.clone());
        }

        let weights = match self.method {
            CombineMethod::Mean => uniform_weights(frames.len()),
            CombineMethod::Weighted => ema_weights(frames.len(), self.alpha),
        };

        let mut accumulator = vec![0.0f32; first.as_raw().len()];
        for (frame, weight) in frames.iter().zip(&weights) {
            for (slot, &byte) in accumulator.iter_mut().zip(frame.as_raw()) {
                *slot += weight * byte as f32;
            }
        }

        let pixels = accumulator
            .into_iter()
            .map(|value| value.clamp(0.0, 255.0) as u8)
            .collect();
        let combined = RgbImage::from_raw(width, height, pixels)
            .expect("accumulator length matches the group's dimensions");
        Ok(combined)
    }
}

/// Normalized exponential weights for `n` frames, oldest first. The raw
/// weight of frame `i` is `alpha * (1 - alpha)^(n - 1 - i)`, so the newest
/// frame carries the most weight.
fn ema_weights(n: usize, alpha: f32) -> Vec<f32> {
    let raw: Vec<f32> = (0..n)
        .map(|i| alpha * (1.0 - alpha).powi((n - 1 - i) as i32))
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

fn uniform_weights(n: usize) -> Vec<f32> {
    vec![1.0 / n as f32; n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([value, value, value]))
    }

    #[test]
    fn weights_sum_to_one() {
        for n in 1..=12 {
            for alpha in [0.05, 0.1, 0.5, 0.9, 1.0] {
                let sum: f32 = ema_weights(n, alpha).iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-5,
                    "n={} alpha={} sum={}",
                    n,
                    alpha,
                    sum
                );
            }
        }
    }

    #[test]
    fn newer_frames_weigh_more() {
        let weights = ema_weights(8, 0.3);
        for pair in weights.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn single_frame_is_identity() {
        let combiner = FrameCombiner::new(CombineMethod::Weighted, 0.1);
        let frame = solid(4, 4, 137);
        let combined = combiner.combine(&[frame.clone()]).unwrap();
        assert_eq!(combined, frame);
    }

    #[test]
    fn empty_group_is_rejected() {
        let combiner = FrameCombiner::new(CombineMethod::Mean, 0.1);
        assert!(matches!(
            combiner.combine(&[]),
            Err(CombineError::EmptyInput)
        ));
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let combiner = FrameCombiner::new(CombineMethod::Mean, 0.1);
        let result = combiner.combine(&[solid(4, 4, 10), solid(8, 4, 10)]);
        assert!(matches!(
            result,
            Err(CombineError::ShapeMismatch {
                width: 4,
                height: 4,
                got_width: 8,
                got_height: 4,
            })
        ));
    }

    #[test]
    fn mean_averages_pixels() {
        let combiner = FrameCombiner::new(CombineMethod::Mean, 0.1);
        let combined = combiner
            .combine(&[solid(2, 2, 100), solid(2, 2, 200)])
            .unwrap();
        assert_eq!(combined.get_pixel(0, 0).0, [150, 150, 150]);
    }

    #[test]
    fn weighted_biases_toward_newest() {
        // alpha 0.5 over two frames gives normalized weights 1/3 and 2/3.
        let combiner = FrameCombiner::new(CombineMethod::Weighted, 0.5);
        let combined = combiner
            .combine(&[solid(2, 2, 100), solid(2, 2, 200)])
            .unwrap();
        assert_eq!(combined.get_pixel(0, 0).0, [166, 166, 166]);
    }

    #[test]
    fn output_shape_matches_input() {
        let combiner = FrameCombiner::new(CombineMethod::Weighted, 0.1);
        let combined = combiner
            .combine(&[solid(6, 3, 10), solid(6, 3, 20), solid(6, 3, 30)])
            .unwrap();
        assert_eq!(combined.dimensions(), (6, 3));
    }
}
