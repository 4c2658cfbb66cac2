//! Lag-j autocorrelation by single-pass circular buffer.

/// Sample autocorrelation of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Autocorrelation {
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation (population form).
    pub std_dev: f64,
    /// `coefficients[j - 1]` is the lag-`j` autocorrelation.
    pub coefficients: Vec<f64>,
}

impl Autocorrelation {
    /// Lag-`j` coefficient, `j >= 1`.
    pub fn lag(&self, j: usize) -> Option<f64> {
        j.checked_sub(1).and_then(|i| self.coefficients.get(i).copied())
    }
}

/// Autocorrelation for lags `1..=max_lag`.
///
/// Keeps only `max_lag + 1` values in a circular buffer while accumulating
/// the lagged cross-products, then corrects by the global mean. Returns
/// `None` when the sequence is not longer than `max_lag` or `max_lag` is
/// zero. A zero-variance sequence yields all-zero coefficients.
pub fn autocorrelation(data: &[f64], max_lag: usize) -> Option<Autocorrelation> {
    let n = data.len();
    if max_lag == 0 || n <= max_lag {
        return None;
    }
    let size = max_lag + 1;
    let mut hold = vec![0.0; size];
    let mut cosum = vec![0.0; size];
    let mut sum = 0.0;

    for (slot, &x) in hold.iter_mut().zip(data) {
        *slot = x;
        sum += x;
    }
    let mut p = 0;
    for &x in &data[size..] {
        for (j, c) in cosum.iter_mut().enumerate() {
            *c += hold[p] * hold[(p + j) % size];
        }
        sum += x;
        hold[p] = x;
        p = (p + 1) % size;
    }
    // Flush the buffer.
    for _ in 0..size {
        for (j, c) in cosum.iter_mut().enumerate() {
            *c += hold[p] * hold[(p + j) % size];
        }
        hold[p] = 0.0;
        p = (p + 1) % size;
    }

    let mean = sum / n as f64;
    for (j, c) in cosum.iter_mut().enumerate() {
        *c = *c / (n - j) as f64 - mean * mean;
    }
    let variance = cosum[0];
    let degenerate = !(variance > 1e-12 * mean * mean) || !variance.is_finite();
    let coefficients = if degenerate {
        vec![0.0; max_lag]
    } else {
        cosum[1..].iter().map(|c| c / variance).collect()
    };
    Some(Autocorrelation {
        mean,
        std_dev: variance.max(0.0).sqrt(),
        coefficients,
    })
}

/// Lag-1 autocorrelation, with `0.0` for sequences too short or constant.
pub fn lag1_autocorrelation(data: &[f64]) -> f64 {
    autocorrelation(data, 1)
        .and_then(|a| a.lag(1))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct definition, for comparison.
    fn naive(data: &[f64], j: usize) -> f64 {
        let n = data.len();
        let mean = data.iter().sum::<f64>() / n as f64;
        let c0 = data.iter().map(|x| x * x).sum::<f64>() / n as f64 - mean * mean;
        let cj = (0..n - j).map(|i| data[i] * data[i + j]).sum::<f64>() / (n - j) as f64
            - mean * mean;
        cj / c0
    }

    #[test]
    fn test_matches_direct_definition() {
        let data: Vec<f64> = (0..50).map(|i| ((i * 37) % 11) as f64 + 0.5 * i as f64).collect();
        let acs = autocorrelation(&data, 3).unwrap();
        for j in 1..=3 {
            let expected = naive(&data, j);
            let got = acs.lag(j).unwrap();
            assert!((got - expected).abs() < 1e-9, "lag {j}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_alternating_sequence_is_negative() {
        let data: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(lag1_autocorrelation(&data) < -0.9);
    }

    #[test]
    fn test_trend_is_positive() {
        let data: Vec<f64> = (0..100).map(f64::from).collect();
        assert!(lag1_autocorrelation(&data) > 0.9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(autocorrelation(&[], 1).is_none());
        assert!(autocorrelation(&[1.0], 1).is_none());
        assert!(autocorrelation(&[1.0, 2.0], 0).is_none());
        let constant = autocorrelation(&[3.0; 20], 2).unwrap();
        assert_eq!(constant.coefficients, vec![0.0, 0.0]);
        assert_eq!(lag1_autocorrelation(&[2.5; 10]), 0.0);
        assert_eq!(lag1_autocorrelation(&[0.0; 10]), 0.0);
    }
}
