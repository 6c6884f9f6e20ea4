//! Splits a state-of-charge trajectory into charge and discharge energy.

/// Per-step charge and discharge energy derived from SoC differences.
///
/// `delta[0]` is defined as zero, so the first step never carries a flow and
/// `Σcharge - Σdischarge == soc[last] - soc[first]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowDecomposition {
    /// Energy added to storage per step (kWh, >= 0).
    pub charge_kwh: Vec<f64>,
    /// Energy removed from storage per step (kWh, >= 0).
    pub discharge_kwh: Vec<f64>,
}

impl FlowDecomposition {
    /// Total energy charged into the battery.
    pub fn total_charge_kwh(&self) -> f64 {
        self.charge_kwh.iter().sum()
    }

    /// Total energy discharged from the battery.
    pub fn total_discharge_kwh(&self) -> f64 {
        self.discharge_kwh.iter().sum()
    }

    /// Net change of stored energy over the run.
    pub fn net_kwh(&self) -> f64 {
        self.total_charge_kwh() - self.total_discharge_kwh()
    }

    pub fn len(&self) -> usize {
        self.charge_kwh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charge_kwh.is_empty()
    }
}

/// Decomposes the first difference of `soc_kwh` into charge and discharge.
pub fn decompose(soc_kwh: &[f64]) -> FlowDecomposition {
    let deltas = std::iter::once(0.0).chain(soc_kwh.windows(2).map(|w| w[1] - w[0]));
    let (charge_kwh, discharge_kwh) = deltas
        .take(soc_kwh.len())
        .map(|d| (d.max(0.0), (-d).max(0.0)))
        .unzip();
    FlowDecomposition {
        charge_kwh,
        discharge_kwh,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn empty_trajectory() {
        let flows = decompose(&[]);
        assert!(flows.is_empty());
        assert_eq!(flows.total_charge_kwh(), 0.0);
    }

    #[test]
    fn single_step_has_no_flow() {
        let flows = decompose(&[7.0]);
        assert_eq!(flows.charge_kwh, vec![0.0]);
        assert_eq!(flows.discharge_kwh, vec![0.0]);
    }

    #[test]
    fn splits_by_sign() {
        let flows = decompose(&[10.0, 12.0, 11.5, 11.5, 13.0]);
        assert_eq!(flows.len(), 5);
        assert_abs_diff_eq!(
            flows.charge_kwh.as_slice(),
            [0.0, 2.0, 0.0, 0.0, 1.5].as_slice(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            flows.discharge_kwh.as_slice(),
            [0.0, 0.0, 0.5, 0.0, 0.0].as_slice(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn at_most_one_flow_per_step() {
        let flows = decompose(&[5.0, 4.0, 6.0, 6.0, 2.0]);
        for (c, d) in flows.charge_kwh.iter().zip(&flows.discharge_kwh) {
            assert!(*c >= 0.0 && *d >= 0.0);
            assert!(*c == 0.0 || *d == 0.0);
        }
    }

    #[test]
    fn telescopes_to_endpoint_difference() {
        let soc: Vec<f64> = (0..500).map(|i| 5.0 + ((i as f64) * 0.13).cos() * 3.0).collect();
        let flows = decompose(&soc);
        let expected = soc[soc.len() - 1] - soc[0];
        assert_abs_diff_eq!(flows.net_kwh(), expected, epsilon = 1e-9);
    }
}
