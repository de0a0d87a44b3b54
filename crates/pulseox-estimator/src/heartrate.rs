//! Heart rate from the infrared window's autocorrelation.
//!
//! The pulsatile (AC) part of the infrared channel repeats once per beat.
//! After removing the DC level, the lag with the strongest normalized
//! autocorrelation inside the physiological band gives the beat period.

/// Result of a heart-rate search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseEstimate {
    /// Beats per minute.
    pub bpm: f64,
    /// Normalized autocorrelation at the chosen lag, in `(0, 1]`.
    pub confidence: f64,
}

/// Estimate heart rate from `signal` sampled at `sample_rate` Hz.
///
/// Searches lags corresponding to `[bpm_min, bpm_max]`. Returns `None` when
/// the window is too short, flat, or has no positive correlation peak in
/// band.
pub fn estimate_heart_rate(
    signal: &[u32],
    sample_rate: f64,
    bpm_min: f64,
    bpm_max: f64,
) -> Option<PulseEstimate> {
    let centered = remove_mean(signal);
    let freq_low = bpm_min / 60.0;
    let freq_high = bpm_max / 60.0;

    let (lag, acf) = autocorrelation_peak(&centered, sample_rate, freq_low, freq_high);
    if lag == 0 {
        return None;
    }

    Some(PulseEstimate {
        bpm: sample_rate * 60.0 / lag as f64,
        confidence: acf,
    })
}

fn remove_mean(signal: &[u32]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }
    let mean = signal.iter().map(|&x| f64::from(x)).sum::<f64>() / signal.len() as f64;
    signal.iter().map(|&x| f64::from(x) - mean).collect()
}

/// Find the dominant periodicity via autocorrelation in `[freq_low, freq_high]`.
///
/// Returns `(period_in_samples, peak_normalized_acf)`, or `(0, 0.0)` if no
/// positive peak exists. `signal` must already be mean-free.
fn autocorrelation_peak(
    signal: &[f64],
    sample_rate: f64,
    freq_low: f64,
    freq_high: f64,
) -> (usize, f64) {
    let n = signal.len();
    if n < 4 || freq_low <= 0.0 || freq_high <= freq_low {
        return (0, 0.0);
    }

    // Highest frequency = shortest period.
    let min_lag = ((sample_rate / freq_high).floor() as usize).max(1);
    let max_lag = ((sample_rate / freq_low).ceil() as usize).min(n / 2);

    if min_lag >= max_lag {
        return (0, 0.0);
    }

    let acf0: f64 = signal.iter().map(|&x| x * x).sum();
    if acf0 < 1e-9 {
        return (0, 0.0);
    }

    let mut best_lag = 0;
    let mut best_acf = f64::MIN;

    for lag in min_lag..=max_lag {
        let acf: f64 = signal
            .iter()
            .take(n - lag)
            .enumerate()
            .map(|(i, &x)| x * signal[i + lag])
            .sum();

        let normalized = acf / acf0;
        if normalized > best_acf {
            best_acf = normalized;
            best_lag = lag;
        }
    }

    if best_acf > 0.0 {
        (best_lag, best_acf)
    } else {
        (0, 0.0)
    }
}
