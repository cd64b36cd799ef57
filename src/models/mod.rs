use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString,
    EnumIter, AsRefStr,
)]
pub(crate) enum Stability {
    Low,
    Medium,
    #[default]
    High,
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString,
    EnumIter, AsRefStr,
)]
pub(crate) enum Solubility {
    #[serde(rename = "Water-soluble")]
    #[strum(serialize = "Water-soluble")]
    WaterSoluble,
    #[default]
    #[serde(rename = "Organic-soluble")]
    #[strum(serialize = "Organic-soluble")]
    OrganicSoluble,
    Both,
}

/// Valid range and fallback of one numeric criterion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl FieldBounds {
    pub const BOILING_POINT: FieldBounds = FieldBounds {
        min: 50.0,
        max: 200.0,
        default: 100.0,
    };

    pub const VISCOSITY: FieldBounds = FieldBounds {
        min: 10.0,
        max: 100.0,
        default: 45.0,
    };

    /// Coerces raw form text into a value inside the bounds.
    ///
    /// Empty or non-numeric text yields the default; anything else is
    /// clamped to the nearest bound.
    pub fn sanitize(&self, raw: &str) -> f64 {
        let raw = raw.trim();
        if raw.is_empty() {
            return self.default;
        }
        match raw.parse::<f64>() {
            Ok(v) if !v.is_nan() => v.clamp(self.min, self.max),
            _ => self.default,
        }
    }
}

/// Target properties of one discovery submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Criteria {
    pub boiling_point: f64,
    pub viscosity: f64,
    pub stability: Stability,
    pub solubility: Solubility,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            boiling_point: FieldBounds::BOILING_POINT.default,
            viscosity: FieldBounds::VISCOSITY.default,
            stability: Stability::default(),
            solubility: Solubility::default(),
        }
    }
}

/// Raw values as typed into the discovery form.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct CriteriaForm {
    pub boiling_point: String,
    pub viscosity: String,
    pub stability: String,
    pub solubility: String,
}

impl CriteriaForm {
    /// Builds criteria that are always valid to send upstream.
    pub fn to_criteria(&self) -> Criteria {
        Criteria {
            boiling_point: FieldBounds::BOILING_POINT.sanitize(&self.boiling_point),
            viscosity: FieldBounds::VISCOSITY.sanitize(&self.viscosity),
            stability: self.stability.parse().unwrap_or_default(),
            solubility: self.solubility.parse().unwrap_or_default(),
        }
    }
}

impl From<&Criteria> for CriteriaForm {
    fn from(c: &Criteria) -> Self {
        Self {
            boiling_point: c.boiling_point.to_string(),
            viscosity: c.viscosity.to_string(),
            stability: c.stability.to_string(),
            solubility: c.solubility.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct PredictedProperties {
    /// Dipole moment (Debye).
    pub mu: f64,
    /// Polarizability (bohr^3).
    pub alpha: f64,
    /// HOMO-LUMO gap (eV).
    pub gap: f64,
    /// Heat capacity (cal/mol·K).
    pub cv: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Compound {
    pub name: String,
    /// Formula or SMILES string.
    pub formula: String,
    pub properties: PredictedProperties,
    pub justification: String,
}

/// A run before the store has assigned its id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct NewDiscoveryRun {
    pub timestamp: i64,
    pub criteria: Criteria,
    pub results: Vec<Compound>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct DiscoveryRun {
    pub id: u64,
    pub timestamp: i64,
    pub criteria: Criteria,
    pub results: Vec<Compound>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl DiscoveryRun {
    pub(crate) fn from_new(id: u64, run: NewDiscoveryRun) -> Self {
        Self {
            id,
            timestamp: run.timestamp,
            criteria: run.criteria,
            results: run.results,
            duration: run.duration,
        }
    }
}
