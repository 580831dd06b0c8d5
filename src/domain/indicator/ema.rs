//! Exponential Moving Average indicator.
//!
//! k = 2/(span+1), seeded with the first value, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! No bias adjustment, so every position is defined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_ema(values: &[f64], span: usize) -> IndicatorSeries {
    if span == 0 || values.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(span),
            values: Vec::new(),
        };
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(Some(ema));

    for &x in &values[1..] {
        ema = x * k + ema * (1.0 - k);
        out.push(Some(ema));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeded_with_first_value() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 3);
        assert_eq!(series.get(0), Some(10.0));
        assert_eq!(series.first_valid(), Some(0));
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&[10.0, 20.0, 30.0, 40.0], 3);
        let k = 0.5;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        let e3 = 40.0 * k + e2 * (1.0 - k);
        assert!((series.get(1).unwrap() - e1).abs() < f64::EPSILON);
        assert!((series.get(2).unwrap() - e2).abs() < f64::EPSILON);
        assert!((series.get(3).unwrap() - e3).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_span_1_tracks_input() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(series.values, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn ema_equal_prices() {
        let series = calculate_ema(&[100.0; 6], 4);
        for v in &series.values {
            assert!((v.unwrap() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ema_empty_and_zero_span() {
        assert!(calculate_ema(&[], 3).is_empty());
        assert!(calculate_ema(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn ema_indicator_type() {
        assert_eq!(calculate_ema(&[1.0], 9).indicator_type, IndicatorType::Ema(9));
    }
}
