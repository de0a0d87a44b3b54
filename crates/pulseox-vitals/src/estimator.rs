//! The estimator seam.
//!
//! Saturation and heart-rate estimation is an opaque algorithm supplied by
//! the caller. The session only relies on the contract below: a window of
//! parallel infrared/red samples in, two raw values with independent
//! validity flags out.

/// Raw output of one estimator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    /// Oxygen saturation in percent.
    pub spo2: i32,
    /// Whether the estimator trusts `spo2`.
    pub spo2_valid: bool,
    /// Heart rate in beats per minute.
    pub heart_rate: i32,
    /// Whether the estimator trusts `heart_rate`.
    pub heart_rate_valid: bool,
}

impl Estimate {
    /// Both values valid.
    pub const fn valid(spo2: i32, heart_rate: i32) -> Self {
        Self {
            spo2,
            spo2_valid: true,
            heart_rate,
            heart_rate_valid: true,
        }
    }

    /// Nothing trustworthy.
    pub const fn invalid() -> Self {
        Self {
            spo2: -999,
            spo2_valid: false,
            heart_rate: -999,
            heart_rate_valid: false,
        }
    }
}

/// Saturation / heart-rate estimator over a fixed window.
///
/// `infrared` and `red` always have the same length and are ordered oldest
/// first. Validating the window's content is the estimator's job.
pub trait Estimator {
    fn estimate(&self, infrared: &[u32], red: &[u32]) -> Estimate;
}

impl<F> Estimator for F
where
    F: Fn(&[u32], &[u32]) -> Estimate,
{
    fn estimate(&self, infrared: &[u32], red: &[u32]) -> Estimate {
        self(infrared, red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(est: &dyn Estimator) -> Estimate {
        est.estimate(&[1, 2, 3], &[4, 5, 6])
    }

    #[test]
    fn closures_are_estimators() {
        let est = |ir: &[u32], red: &[u32]| Estimate::valid(ir.len() as i32, red[0] as i32);
        assert_eq!(run(&est), Estimate::valid(3, 4));
    }

    #[test]
    fn estimators_are_object_safe() {
        let a: Box<dyn Estimator> = Box::new(|_: &[u32], _: &[u32]| Estimate::valid(97, 60));
        let b: Box<dyn Estimator> = Box::new(|_: &[u32], _: &[u32]| Estimate::invalid());
        assert!(run(a.as_ref()).spo2_valid);
        assert!(!run(b.as_ref()).heart_rate_valid);
    }
}
