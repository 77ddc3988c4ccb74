//! 1-D tolerance clustering.
//!
//! Values are sorted; a new cluster starts whenever the gap to the previous
//! value exceeds the tolerance. The cluster center is the median, so the
//! result does not depend on input order.

use serde::{Deserialize, Serialize};

/// A cluster of nearby values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Member values, ascending
    pub values: Vec<f32>,
    /// Median of the members
    pub center: f32,
}

impl Cluster {
    fn from_sorted(values: Vec<f32>) -> Self {
        let center = median_sorted(&values);
        Self { values, center }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest member.
    pub fn min(&self) -> f32 {
        self.values.first().copied().unwrap_or(self.center)
    }

    /// Largest member.
    pub fn max(&self) -> f32 {
        self.values.last().copied().unwrap_or(self.center)
    }

    /// Whether `value` lies within `tolerance` of the member range.
    pub fn accepts(&self, value: f32, tolerance: f32) -> bool {
        value >= self.min() - tolerance && value <= self.max() + tolerance
    }
}

/// Cluster values; non-finite values are ignored. Clusters come out ascending.
pub fn cluster_values(values: &[f32], tolerance: f32) -> Vec<Cluster> {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by(f32::total_cmp);

    let tolerance = tolerance.max(0.0);
    let mut clusters = Vec::new();
    let mut current = vec![sorted[0]];

    for &value in &sorted[1..] {
        let last = current[current.len() - 1];
        if value - last > tolerance {
            clusters.push(Cluster::from_sorted(std::mem::take(&mut current)));
        }
        current.push(value);
    }
    clusters.push(Cluster::from_sorted(current));

    clusters
}

/// Index of the cluster whose center is nearest to `value`.
pub fn nearest_cluster(clusters: &[Cluster], value: f32) -> Option<usize> {
    clusters
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.center - value).abs().total_cmp(&(b.center - value).abs()))
        .map(|(i, _)| i)
}

/// Median of an ascending slice (mean of the middle pair for even lengths).
pub fn median_sorted(values: &[f32]) -> f32 {
    match values.len() {
        0 => 0.0,
        n if n % 2 == 1 => values[n / 2],
        n => (values[n / 2 - 1] + values[n / 2]) / 2.0,
    }
}

/// Median of arbitrary values.
pub fn median(values: &[f32]) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f32::total_cmp);
    median_sorted(&sorted)
}

/// Mean and coefficient of variation; `None` for an empty slice or zero mean.
pub fn coefficient_of_variation(values: &[f32]) -> Option<(f32, f32)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    if mean.abs() < f32::EPSILON {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    Some((mean, variance.sqrt() / mean.abs()))
}
