//! Adaptive batch-count selection.

use tracing::debug;

use crate::autocorrelation::lag1_autocorrelation;
use crate::batch::batch_means;
use crate::error::ValidationError;

/// Batch counts tried when none are given.
pub const DEFAULT_BATCH_CANDIDATES: [usize; 3] = [32, 64, 128];

/// Picks the batch count that minimizes the summed squared lag-1
/// autocorrelation of the batch means over all `sequences` jointly.
///
/// A candidate is feasible when it is at least two and every sequence has
/// at least that many observations. Ties keep the earlier candidate.
pub fn select_batch_count<'a, I>(sequences: I, candidates: &[usize]) -> Result<usize, ValidationError>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let sequences: Vec<&[f64]> = sequences.into_iter().collect();
    let shortest = sequences.iter().map(|s| s.len()).min().unwrap_or(0);

    let mut best: Option<(usize, f64)> = None;
    for &k in candidates {
        if k < 2 || k > shortest {
            continue;
        }
        let score: f64 = sequences
            .iter()
            .map(|s| lag1_autocorrelation(&batch_means(s, k)).powi(2))
            .sum();
        debug!(batch_count = k, score, "Batch count candidate");
        if best.map_or(true, |(_, b)| score < b) {
            best = Some((k, score));
        }
    }

    best.map(|(k, _)| k)
        .ok_or_else(|| ValidationError::NoFeasibleBatchCount {
            candidates: candidates.to_vec(),
            shortest,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// AR(1) sequence with strong positive correlation at short lags.
    fn correlated(n: usize) -> Vec<f64> {
        let mut state: u64 = 12345;
        let mut x = 0.0;
        (0..n)
            .map(|_| {
                state = state * 48271 % 2147483647;
                x = 0.99 * x + (state as f64 / 2147483647.0 - 0.5);
                x
            })
            .collect()
    }

    #[test]
    fn test_prefers_larger_batches_for_correlated_data() {
        let data = correlated(12_800);
        let k = select_batch_count([data.as_slice()], &[128, 32]).unwrap();
        assert_eq!(k, 32);
    }

    #[test]
    fn test_skips_infeasible_candidates() {
        let data = vec![1.0; 40];
        let k = select_batch_count([data.as_slice()], &[64, 128, 32]).unwrap();
        assert_eq!(k, 32);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let data = vec![1.0; 1000];
        let k = select_batch_count([data.as_slice()], &DEFAULT_BATCH_CANDIDATES).unwrap();
        assert_eq!(k, 32);
    }

    #[test]
    fn test_no_feasible_candidate() {
        let short = vec![1.0; 10];
        let err = select_batch_count([short.as_slice()], &[32, 64]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NoFeasibleBatchCount {
                candidates: vec![32, 64],
                shortest: 10,
            }
        );
        assert!(select_batch_count(std::iter::empty(), &[32]).is_err());
    }
}
