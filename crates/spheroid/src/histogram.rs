use serde::{Deserialize, Serialize};

pub const BINS: usize = 256;

/// Frequency of each 8-bit intensity over a sample set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityHistogram {
    pub counts: Vec<u64>,
}

impl IntensityHistogram {
    pub fn from_samples(samples: &[u8]) -> Self {
        let mut counts = vec![0u64; BINS];
        for &value in samples {
            counts[value as usize] += 1;
        }
        Self { counts }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Height of the tallest bin
    pub fn peak(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Mean intensity, `None` for an empty histogram.
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted: f64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(value, &count)| value as f64 * count as f64)
            .sum();
        Some(weighted / total as f64)
    }
}

impl Default for IntensityHistogram {
    fn default() -> Self {
        Self { counts: vec![0; BINS] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning_covers_full_range() {
        let hist = IntensityHistogram::from_samples(&[0, 0, 128, 255]);
        assert_eq!(hist.counts.len(), 256);
        assert_eq!(hist.counts[0], 2);
        assert_eq!(hist.counts[128], 1);
        assert_eq!(hist.counts[255], 1);
        assert_eq!(hist.total(), 4);
        assert_eq!(hist.peak(), 2);
    }

    #[test]
    fn test_mean_matches_samples() {
        let samples = [10u8, 20, 30, 40];
        let hist = IntensityHistogram::from_samples(&samples);
        assert_eq!(hist.mean(), Some(25.0));
    }

    #[test]
    fn test_empty_histogram_has_no_mean() {
        let hist = IntensityHistogram::from_samples(&[]);
        assert_eq!(hist.total(), 0);
        assert_eq!(hist.mean(), None);
        assert_eq!(hist, IntensityHistogram::default());
    }
}
