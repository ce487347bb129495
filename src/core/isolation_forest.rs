//! Seeded isolation forest.
//!
//! Points that random axis-aligned splits isolate quickly get short average
//! path lengths and therefore high anomaly scores. The forest flags the
//! `contamination` share of the training set with the highest scores.

use crate::domain::ports::OutlierScorer;
use crate::utils::error::{CareError, Result};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

pub const DEFAULT_TREES: usize = 100;
pub const DEFAULT_MAX_SAMPLES: usize = 256;
pub const DEFAULT_CONTAMINATION: f64 = 0.1;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone)]
pub struct IsolationForest {
    pub trees: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            trees: DEFAULT_TREES,
            max_samples: DEFAULT_MAX_SAMPLES,
            contamination: DEFAULT_CONTAMINATION,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, sample: &[f64], depth: f64) -> f64 {
        match self {
            Node::Leaf { size } => depth + average_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] < *threshold {
                    left.path_length(sample, depth + 1.0)
                } else {
                    right.path_length(sample, depth + 1.0)
                }
            }
        }
    }
}

/// 二元搜尋樹中未成功搜尋的平均路徑長度 c(n)
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

fn build_tree(
    samples: &[Vec<f64>],
    rows: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    let width = samples[rows[0]].len();
    // 只在仍有差異的特徵中挑選
    let candidates: Vec<(usize, f64, f64)> = (0..width)
        .filter_map(|feature| {
            let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = samples[r][feature];
                (lo.min(v), hi.max(v))
            });
            (max > min).then_some((feature, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(min..max);
    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&r| samples[r][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(samples, left_rows, depth + 1, height_limit, rng)),
        right: Box::new(build_tree(samples, right_rows, depth + 1, height_limit, rng)),
    }
}

impl IsolationForest {
    pub fn new(trees: usize, max_samples: usize, contamination: f64, seed: u64) -> Self {
        Self {
            trees,
            max_samples,
            contamination,
            seed,
        }
    }

    fn check(&self, samples: &[Vec<f64>]) -> Result<()> {
        if self.trees == 0 {
            return Err(CareError::processing("isolation forest needs at least one tree"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(CareError::processing(format!(
                "contamination {} outside (0, 0.5]",
                self.contamination
            )));
        }
        if let Some(first) = samples.first() {
            if samples.iter().any(|row| row.len() != first.len()) {
                return Err(CareError::processing("feature rows have different widths"));
            }
            if samples.iter().flatten().any(|v| !v.is_finite()) {
                return Err(CareError::processing("feature matrix contains non-finite values"));
            }
        }
        Ok(())
    }

    /// Anomaly score in (0, 1]; higher means easier to isolate.
    pub fn score_samples(&self, samples: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.check(samples)?;
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let sample_size = self.max_samples.max(2).min(samples.len());
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let forest: Vec<Node> = (0..self.trees)
            .map(|_| {
                let rows = index::sample(&mut rng, samples.len(), sample_size).into_vec();
                build_tree(samples, rows, 0, height_limit, &mut rng)
            })
            .collect();

        let normaliser = average_path_length(sample_size);
        let scores = samples
            .iter()
            .map(|sample| {
                let mean_depth = forest
                    .iter()
                    .map(|tree| tree.path_length(sample, 0.0))
                    .sum::<f64>()
                    / forest.len() as f64;
                if normaliser > 0.0 {
                    2f64.powf(-mean_depth / normaliser)
                } else {
                    // 只有單一樣本，無從比較
                    0.5
                }
            })
            .collect();

        tracing::debug!(
            "Isolation forest scored {} samples with {} trees (sample size {}, height limit {})",
            samples.len(),
            self.trees,
            sample_size,
            height_limit
        );
        Ok(scores)
    }
}

impl OutlierScorer for IsolationForest {
    fn fit_predict(&self, samples: &[Vec<f64>]) -> Result<Vec<bool>> {
        let scores = self.score_samples(samples)?;
        let Some(threshold) =
            crate::core::stats::percentile(&scores, 100.0 * (1.0 - self.contamination))
        else {
            return Ok(Vec::new());
        };
        Ok(scores.into_iter().map(|score| score > threshold).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohort_with_outlier() -> Vec<Vec<f64>> {
        let mut samples: Vec<Vec<f64>> = (0..19)
            .map(|i| vec![0.7 + (i as f64) * 0.005, 0.1 + ((i * 7) % 19) as f64 * 0.002])
            .collect();
        samples.push(vec![0.05, 0.45]);
        samples
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.244).abs() < 0.01);
    }

    #[test]
    fn test_obvious_outlier_scores_highest() {
        let samples = cohort_with_outlier();
        let scores = IsolationForest::default().score_samples(&samples).unwrap();
        let top = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(top, 19);
    }

    #[test]
    fn test_flags_ten_percent_repeatably() {
        let samples = cohort_with_outlier();
        let forest = IsolationForest::default();
        let first = forest.fit_predict(&samples).unwrap();
        let second = forest.fit_predict(&samples).unwrap();

        assert_eq!(first, second);
        let flagged = first.iter().filter(|f| **f).count();
        assert!((1..=2).contains(&flagged));
        assert!(first[19]);
    }

    #[test]
    fn test_empty_and_single_sample() {
        let forest = IsolationForest::default();
        assert!(forest.fit_predict(&[]).unwrap().is_empty());
        assert_eq!(forest.fit_predict(&[vec![0.5, 0.0]]).unwrap(), vec![false]);
    }

    #[test]
    fn test_rejects_invalid_contamination() {
        let forest = IsolationForest::new(10, 256, 0.0, 1);
        assert!(forest.fit_predict(&[vec![1.0]]).is_err());
    }
}
