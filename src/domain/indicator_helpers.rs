//! Shared numeric helpers for indicator and feature calculations.
//!
//! Series are aligned with their input: `None` marks a position whose window
//! is not yet complete (or whose inputs were undefined).

use std::cmp::Ordering;

/// Lift a fully-defined slice into an aligned series.
pub fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| Some(v)).collect()
}

/// Complete window ending at `i`, or `None` if any element is undefined.
pub(crate) fn window_at(values: &[Option<f64>], i: usize, period: usize) -> Option<Vec<f64>> {
    if period == 0 || i + 1 < period {
        return None;
    }
    values[i + 1 - period..=i].iter().copied().collect()
}

/// Fractional change over `lag` positions: (x[i] - x[i-lag]) / x[i-lag].
pub fn pct_change(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if lag == 0 || i < lag {
                return None;
            }
            let prev = values[i - lag];
            if prev == 0.0 {
                None
            } else {
                Some((values[i] - prev) / prev)
            }
        })
        .collect()
}

/// First difference; the leading element is undefined.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i == 0 { None } else { Some(values[i] - values[i - 1]) })
        .collect()
}

pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| window_at(values, i, period).map(|w| mean(&w)))
        .collect()
}

/// (x - rolling_mean) / (rolling_stdev + eps) over a trailing window.
pub fn rolling_zscore(values: &[Option<f64>], period: usize, eps: f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let w = window_at(values, i, period)?;
            let x = values[i]?;
            Some((x - mean(&w)) / (sample_std(&w)? + eps))
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n-1) standard deviation; undefined below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Rank of each value within the batch, normalized by count.
///
/// Ties share the average of their ranks, so the result lies in (0, 1].
pub fn percentile_rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let denom = n as f64;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let avg_rank = ((i + j - 1) as f64 / 2.0 + 1.0) / denom;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Linearly interpolated quantile, `q` in [0, 1]. Empty input yields 0.0.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_lags() {
        let r = pct_change(&[100.0, 110.0, 99.0], 1);
        assert_eq!(r[0], None);
        assert!((r[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((r[2].unwrap() + 0.1).abs() < 1e-12);

        let r = pct_change(&[100.0, 110.0, 120.0], 2);
        assert_eq!(r[1], None);
        assert!((r[2].unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn pct_change_zero_base_is_undefined() {
        let r = pct_change(&[0.0, 1.0], 1);
        assert_eq!(r[1], None);
    }

    #[test]
    fn diff_basic() {
        assert_eq!(diff(&[1.0, 4.0, 2.0]), vec![None, Some(3.0), Some(-2.0)]);
    }

    #[test]
    fn rolling_mean_requires_full_window() {
        let values = vec![None, Some(1.0), Some(2.0), Some(3.0)];
        let m = rolling_mean(&values, 2);
        assert_eq!(m[0], None);
        assert_eq!(m[1], None);
        assert_eq!(m[2], Some(1.5));
        assert_eq!(m[3], Some(2.5));
    }

    #[test]
    fn sample_std_known_values() {
        // population stdev of this set is 2.0, sample is sqrt(32/7)
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = sample_std(&v).unwrap();
        assert!((s - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn zscore_of_constant_window_is_zero() {
        let values = defined(&[5.0; 10]);
        let z = rolling_zscore(&values, 5, 1e-9);
        assert_eq!(z[3], None);
        assert_eq!(z[9], Some(0.0));
    }

    #[test]
    fn zscore_sign_follows_deviation() {
        let values = defined(&[1.0, 1.0, 1.0, 1.0, 10.0]);
        let z = rolling_zscore(&values, 5, 1e-9);
        assert!(z[4].unwrap() > 0.0);
    }

    #[test]
    fn percentile_rank_average_ties() {
        let r = percentile_rank(&[3.0, 1.0, 2.0, 2.0]);
        assert_eq!(r, vec![1.0, 0.25, 0.625, 0.625]);
    }

    #[test]
    fn percentile_rank_empty() {
        assert!(percentile_rank(&[]).is_empty());
    }

    #[test]
    fn quantile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&v, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile(&v, 1.0) - 4.0).abs() < 1e-12);
        // rank 0.05 * 3 = 0.15 -> 1.0 + 0.15
        assert!((quantile(&v, 0.05) - 1.15).abs() < 1e-12);
    }

    #[test]
    fn quantile_empty_and_single() {
        assert_eq!(quantile(&[], 0.5), 0.0);
        assert_eq!(quantile(&[7.0], 0.95), 7.0);
    }
}
