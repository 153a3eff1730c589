//! JSON scenario for `plan`. Every field is optional.

use beamplan::api::{
    breast_isocenter, AngleRange, GantryCfg, Laterality, MachineParams, NelderMeadCoeffs,
    RectAperture, SimplexCfg, WeightBounds,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl From<Side> for Laterality {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Laterality::Left,
            Side::Right => Laterality::Right,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineSpec {
    pub machine_id: String,
    pub energy: String,
    pub dose_rate: u32,
    pub technique: String,
}

impl Default for MachineSpec {
    fn default() -> Self {
        let m = MachineParams::default();
        Self {
            machine_id: m.machine_id,
            energy: m.energy,
            dose_rate: m.dose_rate,
            technique: m.technique,
        }
    }
}

impl From<&MachineSpec> for MachineParams {
    fn from(m: &MachineSpec) -> Self {
        Self {
            machine_id: m.machine_id.clone(),
            energy: m.energy.clone(),
            dose_rate: m.dose_rate,
            technique: m.technique.clone(),
        }
    }
}

/// Gantry scan ranges as `[start, end)` pairs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GantrySpec {
    pub left: [i32; 2],
    pub right: [i32; 2],
}

impl Default for GantrySpec {
    fn default() -> Self {
        let cfg = GantryCfg::default();
        Self {
            left: [cfg.left.start, cfg.left.end],
            right: [cfg.right.start, cfg.right.end],
        }
    }
}

impl From<GantrySpec> for GantryCfg {
    fn from(g: GantrySpec) -> Self {
        Self {
            left: AngleRange {
                start: g.left[0],
                end: g.left[1],
            },
            right: AngleRange {
                start: g.right[0],
                end: g.right[1],
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimplexSpec {
    pub w_min: f64,
    pub w_max: f64,
    pub max_iterations: usize,
    pub dose_tol: f64,
    pub init_step_frac: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub rho: f64,
    pub sigma: f64,
}

impl Default for SimplexSpec {
    fn default() -> Self {
        let cfg = SimplexCfg::default();
        Self {
            w_min: cfg.bounds.min,
            w_max: cfg.bounds.max,
            max_iterations: cfg.max_iterations,
            dose_tol: cfg.dose_tol,
            init_step_frac: cfg.init_step_frac,
            alpha: cfg.coeffs.alpha,
            gamma: cfg.coeffs.gamma,
            rho: cfg.coeffs.rho,
            sigma: cfg.coeffs.sigma,
        }
    }
}

impl From<SimplexSpec> for SimplexCfg {
    fn from(s: SimplexSpec) -> Self {
        Self {
            bounds: WeightBounds {
                min: s.w_min,
                max: s.w_max,
            },
            max_iterations: s.max_iterations,
            dose_tol: s.dose_tol,
            init_step_frac: s.init_step_frac,
            coeffs: NelderMeadCoeffs {
                alpha: s.alpha,
                gamma: s.gamma,
                rho: s.rho,
                sigma: s.sigma,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub side: Side,
    /// `[x1, y1, x2, y2]` in mm; defaults to a posterior half-beam block.
    pub jaws: Option<[f64; 4]>,
    /// `[x, y, z]` in mm; defaults to the phantom target center.
    pub isocenter: Option<[f64; 3]>,
    pub machine: MachineSpec,
    pub gantry: GantrySpec,
    pub simplex: SimplexSpec,
    pub fold_to_45: bool,
    /// Weight sum the treatment fields are equalized to before optimizing.
    pub total_weight: f64,
    /// Margin band width around the target outline, reported as an area.
    pub margin_mm: f64,
    /// Refuse dose recomputation (optimizer runs on stale dose).
    pub lock_dose: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            side: Side::Left,
            jaws: None,
            isocenter: None,
            machine: MachineSpec::default(),
            gantry: GantrySpec::default(),
            simplex: SimplexSpec::default(),
            fold_to_45: true,
            total_weight: 1.0,
            margin_mm: 5.0,
            lock_dose: false,
        }
    }
}

impl Scenario {
    pub fn laterality(&self) -> Laterality {
        self.side.into()
    }

    pub fn jaws(&self) -> RectAperture {
        match (self.jaws, self.side) {
            (Some([x1, y1, x2, y2]), _) => RectAperture::new(x1, y1, x2, y2),
            (None, Side::Left) => RectAperture::new(-100.0, -100.0, 0.0, 100.0),
            (None, Side::Right) => RectAperture::new(100.0, -100.0, 0.0, 100.0),
        }
    }

    pub fn isocenter(&self) -> Vector3<f64> {
        self.isocenter
            .map(Vector3::from)
            .unwrap_or_else(|| breast_isocenter(self.laterality()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let s: Scenario = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Scenario::default());
        assert_eq!(SimplexCfg::from(s.simplex), SimplexCfg::default());
        assert_eq!(GantryCfg::from(s.gantry), GantryCfg::default());
        assert_eq!(MachineParams::from(&s.machine), MachineParams::default());
        assert_eq!(s.jaws(), RectAperture::new(-100.0, -100.0, 0.0, 100.0));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let s: Scenario = serde_json::from_str(
            r#"{"side": "right", "simplex": {"max_iterations": 5}, "isocenter": [1, 2, 3]}"#,
        )
        .unwrap();
        assert_eq!(s.laterality(), Laterality::Right);
        let cfg = SimplexCfg::from(s.simplex);
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.bounds, WeightBounds::default());
        assert_eq!(s.isocenter(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(s.jaws().x_range(), (0.0, 100.0));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<Scenario>(r#"{"sides": "left"}"#).is_err());
    }
}
