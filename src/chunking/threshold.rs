//! Adaptive boundary thresholds.
//!
//! Every method derives its cutoff from the distances of the document being
//! segmented, so a uniformly dense transcript and a topic-hopping one both get
//! boundaries at their own relative peaks.

use crate::config::ThresholdType;

/// Indices `i` such that a chunk boundary falls between unit `i` and `i + 1`.
pub fn breakpoints(distances: &[f64], kind: ThresholdType, amount: f64) -> Vec<usize> {
    if distances.is_empty() {
        return Vec::new();
    }

    let signal = match kind {
        ThresholdType::Gradient => gradient(distances),
        _ => distances.to_vec(),
    };
    if signal.is_empty() {
        return Vec::new();
    }

    let cutoff = match kind {
        ThresholdType::Percentile | ThresholdType::Gradient => percentile(&signal, amount),
        ThresholdType::StandardDeviation => mean(&signal) + amount * std_dev(&signal),
        ThresholdType::Interquartile => {
            let iqr = percentile(&signal, 75.0) - percentile(&signal, 25.0);
            mean(&signal) + amount * iqr
        }
    };

    signal
        .iter()
        .enumerate()
        .filter(|(_, value)| **value > cutoff)
        .map(|(i, _)| i)
        .collect()
}

/// Linear-interpolated percentile, `p` in 0..=100.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Central differences inside, one-sided differences at the edges.
fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return Vec::new();
    }

    (0..n)
        .map(|i| {
            if i == 0 {
                values[1] - values[0]
            } else if i == n - 1 {
                values[n - 1] - values[n - 2]
            } else {
                (values[i + 1] - values[i - 1]) / 2.0
            }
        })
        .collect()
}
