//! Sweepable parameters and the systematic calibration plan.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationParams;

/// The detection parameters the calibrator can vary one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    VorticityPercentile,
    WindPercentile,
    MaxCycloneSpeedKmh,
    ClusterRadiusKm,
    MinLifetimeSteps,
}

impl SweepParameter {
    /// Every tunable, in sweep priority order.
    pub const ALL: [SweepParameter; 5] = [
        SweepParameter::VorticityPercentile,
        SweepParameter::WindPercentile,
        SweepParameter::MaxCycloneSpeedKmh,
        SweepParameter::ClusterRadiusKm,
        SweepParameter::MinLifetimeSteps,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SweepParameter::VorticityPercentile => "vorticity_percentile",
            SweepParameter::WindPercentile => "wind_percentile",
            SweepParameter::MaxCycloneSpeedKmh => "max_cyclone_speed_kmh",
            SweepParameter::ClusterRadiusKm => "cluster_radius_km",
            SweepParameter::MinLifetimeSteps => "min_lifetime_steps",
        }
    }

    pub fn priority(&self) -> usize {
        match self {
            SweepParameter::VorticityPercentile => 1,
            SweepParameter::WindPercentile => 2,
            SweepParameter::MaxCycloneSpeedKmh => 3,
            SweepParameter::ClusterRadiusKm => 4,
            SweepParameter::MinLifetimeSteps => 5,
        }
    }

    /// Candidate values and step size for the systematic plan.
    ///
    /// `None` for `min_lifetime_steps`: moving it redefines what counts as
    /// a storm rather than tuning how storms are found, so the plan holds
    /// it at the base value. It can still be swept explicitly through
    /// [`calibrate_parameter`](crate::calibration::calibrate_parameter).
    pub fn planned_sweep(&self) -> Option<(&'static [f64], f64)> {
        match self {
            SweepParameter::VorticityPercentile => Some((&[98.0, 98.5, 99.0, 99.5, 99.8], 0.5)),
            SweepParameter::WindPercentile => Some((&[80.0, 85.0, 90.0, 95.0], 5.0)),
            SweepParameter::MaxCycloneSpeedKmh => Some((&[80.0, 100.0, 120.0, 150.0], 20.0)),
            SweepParameter::ClusterRadiusKm => Some((&[200.0, 250.0, 300.0, 350.0, 400.0], 50.0)),
            SweepParameter::MinLifetimeSteps => None,
        }
    }

    pub fn get(&self, params: &CalibrationParams) -> f64 {
        match self {
            SweepParameter::VorticityPercentile => params.vorticity_percentile,
            SweepParameter::WindPercentile => params.wind_percentile,
            SweepParameter::MaxCycloneSpeedKmh => params.max_cyclone_speed_kmh,
            SweepParameter::ClusterRadiusKm => params.cluster_radius_km,
            SweepParameter::MinLifetimeSteps => params.min_lifetime_steps as f64,
        }
    }

    /// Copy of `params` with this parameter set to `value`.
    pub fn apply(&self, params: &CalibrationParams, value: f64) -> CalibrationParams {
        let mut out = params.clone();
        match self {
            SweepParameter::VorticityPercentile => out.vorticity_percentile = value,
            SweepParameter::WindPercentile => out.wind_percentile = value,
            SweepParameter::MaxCycloneSpeedKmh => out.max_cyclone_speed_kmh = value,
            SweepParameter::ClusterRadiusKm => out.cluster_radius_km = value,
            SweepParameter::MinLifetimeSteps => out.min_lifetime_steps = value.round() as usize,
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterPlan {
    pub current: f64,
    pub range: Vec<f64>,
    pub step: f64,
    pub priority: usize,
}

/// Which parameters to sweep, over which values, in which order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationPlan {
    pub parameters: BTreeMap<String, ParameterPlan>,
    pub priority_order: Vec<String>,
}

pub fn generate_calibration_plan(base: &CalibrationParams) -> CalibrationPlan {
    let mut parameters = BTreeMap::new();
    let mut priority_order = Vec::new();
    for p in SweepParameter::ALL {
        let Some((range, step)) = p.planned_sweep() else {
            continue;
        };
        priority_order.push(p.key().to_string());
        parameters.insert(
            p.key().to_string(),
            ParameterPlan {
                current: p.get(base),
                range: range.to_vec(),
                step,
                priority: p.priority(),
            },
        );
    }
    CalibrationPlan {
        parameters,
        priority_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_changes_exactly_one_field() {
        let base = CalibrationParams::default();
        let tuned = SweepParameter::WindPercentile.apply(&base, 85.0);
        assert_eq!(tuned.wind_percentile, 85.0);
        assert_eq!(tuned.vorticity_percentile, base.vorticity_percentile);
        assert_eq!(tuned.cluster_radius_km, base.cluster_radius_km);
        assert_eq!(tuned.min_lifetime_steps, base.min_lifetime_steps);
    }

    #[test]
    fn get_reads_back_what_apply_wrote() {
        let base = CalibrationParams::default();
        for p in SweepParameter::ALL {
            let tuned = p.apply(&base, 42.0);
            assert_eq!(p.get(&tuned), 42.0, "round trip failed for {}", p.key());
        }
    }

    #[test]
    fn lifetime_applies_as_whole_steps() {
        let base = CalibrationParams::default();
        let tuned = SweepParameter::MinLifetimeSteps.apply(&base, 5.4);
        assert_eq!(tuned.min_lifetime_steps, 5);
        assert_eq!(SweepParameter::MinLifetimeSteps.get(&tuned), 5.0);
    }

    #[test]
    fn plan_covers_all_parameters_in_priority_order() {
        let plan = generate_calibration_plan(&CalibrationParams::default());
        assert_eq!(
            plan.priority_order,
            vec![
                "vorticity_percentile",
                "wind_percentile",
                "max_cyclone_speed_kmh",
                "cluster_radius_km"
            ]
        );
        let vort = &plan.parameters["vorticity_percentile"];
        assert_eq!(vort.current, 99.5);
        assert_eq!(vort.range, vec![98.0, 98.5, 99.0, 99.5, 99.8]);
        assert_eq!(vort.priority, 1);
        let radius = &plan.parameters["cluster_radius_km"];
        assert_eq!(radius.range.len(), 5);
        assert_eq!(radius.step, 50.0);
        assert!(!plan.parameters.contains_key("min_lifetime_steps"));
    }

    #[test]
    fn sweep_parameter_serializes_snake_case() {
        let json = serde_json::to_string(&SweepParameter::MaxCycloneSpeedKmh).unwrap();
        assert_eq!(json, "\"max_cyclone_speed_kmh\"");
        let back: SweepParameter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SweepParameter::MaxCycloneSpeedKmh);
    }
}
