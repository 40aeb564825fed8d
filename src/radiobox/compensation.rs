//! RF output gain compensation
//!
//! The output amplitude of the DAC path depends on frequency and on the load
//! attached to the connector. The board support package provides the
//! correction as a factor per (frequency, termination); the control-state
//! updater asks a [`GainCompensation`] for it whenever the RF output routing
//! changes.

use heapless::Vec;

/// Maximum number of points per termination curve
pub const MAX_POINTS: usize = 32;

/// Source of RF output gain correction factors
pub trait GainCompensation {
    /// Correction factor for a signal of `hz` into a 50 ohm load
    /// (`terminated`) or a high impedance load
    fn factor(&self, hz: f64, terminated: bool) -> f64;
}

/// No correction at all
#[derive(Clone, Copy, Debug, Default)]
pub struct Uncompensated;

impl GainCompensation for Uncompensated {
    fn factor(&self, _hz: f64, _terminated: bool) -> f64 {
        1.0
    }
}

/// Piecewise-linear correction curves, one per termination
///
/// Points must be added in ascending frequency order. Frequencies outside a
/// curve use its first or last factor; an empty curve and 0 Hz give 1.0.
#[derive(Clone, Debug, Default)]
pub struct CompensationTable {
    terminated: Vec<(f64, f64), MAX_POINTS>,
    open: Vec<(f64, f64), MAX_POINTS>,
}

impl CompensationTable {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point to the 50 ohm curve
    ///
    /// # Errors
    /// Returns the point back when the curve is full.
    pub fn push_terminated(&mut self, hz: f64, factor: f64) -> Result<(), (f64, f64)> {
        self.terminated.push((hz, factor))
    }

    /// Add a point to the high impedance curve
    ///
    /// # Errors
    /// Returns the point back when the curve is full.
    pub fn push_open(&mut self, hz: f64, factor: f64) -> Result<(), (f64, f64)> {
        self.open.push((hz, factor))
    }

    fn interpolate(points: &[(f64, f64)], hz: f64) -> f64 {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return 1.0;
        };
        if hz <= first.0 {
            return first.1;
        }
        if hz >= last.0 {
            return last.1;
        }
        points
            .windows(2)
            .find(|w| hz <= w[1].0)
            .map_or(last.1, |w| {
                let (f0, g0) = w[0];
                let (f1, g1) = w[1];
                if f1 == f0 {
                    g1
                } else {
                    g0 + (g1 - g0) * (hz - f0) / (f1 - f0)
                }
            })
    }
}

impl GainCompensation for CompensationTable {
    fn factor(&self, hz: f64, terminated: bool) -> f64 {
        if hz <= 0.0 {
            return 1.0;
        }
        let curve = if terminated { &self.terminated } else { &self.open };
        Self::interpolate(curve, hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_points() {
        let mut table = CompensationTable::new();
        table.push_terminated(1e6, 1.0).unwrap();
        table.push_terminated(21e6, 2.0).unwrap();
        assert!((table.factor(11e6, true) - 1.5).abs() < 1e-9);
        assert_eq!(table.factor(50e6, true), 2.0);
        assert_eq!(table.factor(1e3, true), 1.0);
    }

    #[test]
    fn empty_curve_and_zero_frequency_are_unity() {
        let mut table = CompensationTable::new();
        table.push_terminated(1e6, 1.8).unwrap();
        assert_eq!(table.factor(5e6, false), 1.0);
        assert_eq!(table.factor(0.0, true), 1.0);
    }
}
