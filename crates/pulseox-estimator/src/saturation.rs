//! Oxygen saturation from the red/infrared ratio-of-ratios.

/// Lowest saturation the linear calibration is trusted for.
pub const SPO2_FLOOR: f64 = 70.0;
/// Saturation is capped here.
pub const SPO2_CEILING: f64 = 100.0;

/// DC level and AC amplitude of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelLevels {
    /// Window mean.
    pub dc: f64,
    /// Population standard deviation around `dc`.
    pub ac: f64,
}

impl ChannelLevels {
    /// Measure `signal`. Returns `None` for an empty window or when either
    /// component is too small to divide by.
    pub fn measure(signal: &[u32]) -> Option<Self> {
        if signal.is_empty() {
            return None;
        }
        let n = signal.len() as f64;
        let dc = signal.iter().map(|&x| f64::from(x)).sum::<f64>() / n;
        if dc < 1.0 {
            return None;
        }

        let ac = (signal
            .iter()
            .map(|&x| {
                let diff = f64::from(x) - dc;
                diff * diff
            })
            .sum::<f64>()
            / n)
            .sqrt();
        if ac < 0.001 {
            return None;
        }

        Some(Self { dc, ac })
    }

    /// Perfusion-style ratio `AC / DC`.
    pub fn modulation(&self) -> f64 {
        self.ac / self.dc
    }
}

/// `R = (AC_red / DC_red) / (AC_ir / DC_ir)`.
pub fn ratio_of_ratios(infrared: &[u32], red: &[u32]) -> Option<f64> {
    let ir = ChannelLevels::measure(infrared)?;
    let red = ChannelLevels::measure(red)?;
    Some(red.modulation() / ir.modulation())
}

/// Saturation in whole percent, or `None` when the window does not support
/// a trustworthy value.
pub fn estimate_spo2(infrared: &[u32], red: &[u32]) -> Option<i32> {
    if infrared.len() != red.len() {
        return None;
    }
    let r = ratio_of_ratios(infrared, red)?;
    let spo2 = 110.0 - 25.0 * r;
    if !spo2.is_finite() || spo2 < SPO2_FLOOR {
        return None;
    }
    Some(spo2.min(SPO2_CEILING).round() as i32)
}
