use super::{ApiError, ApiResult, EnvConfig};
use crate::models::{Compound, Criteria, PredictedProperties};
use crate::util::{random_index, random_unit, round2, sleep_ms};
use serde::{Deserialize, Serialize};

/// Something that turns criteria into candidate compounds.
pub(crate) trait CompoundGenerator: Send + Sync {
    async fn generate(&self, criteria: &Criteria) -> ApiResult<Vec<Compound>>;
    async fn health(&self) -> ServiceHealth;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ServiceHealth {
    Mock,
    Healthy,
    Unhealthy(String),
}

const JUSTIFICATIONS: &[&str] = &[
    "Balanced polarity and a moderate HOMO-LUMO gap place this candidate close to the requested boiling point and viscosity window.",
    "Predicted intermolecular forces match the target stability class while keeping the requested solubility profile.",
    "Polarizability sits in a range that favours the requested solvent compatibility without sacrificing thermal stability.",
    "The predicted heat capacity indicates good thermal buffering, consistent with the requested stability level.",
    "Ranked highly for synthesis feasibility: a compact scaffold with well-characterised functional groups.",
    "Electronic structure suggests low reactivity under standard conditions, supporting the requested stability.",
];

fn canned_justification() -> String {
    JUSTIFICATIONS[random_index(JUSTIFICATIONS.len())].to_string()
}

// ============================================================================
// Remote service
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct GenerateRequest {
    pub boiling_point: f64,
    pub viscosity: f64,
    pub stability: String,
    pub solubility: String,
}

impl From<&Criteria> for GenerateRequest {
    fn from(c: &Criteria) -> Self {
        Self {
            boiling_point: c.boiling_point,
            viscosity: c.viscosity,
            stability: c.stability.to_string(),
            solubility: c.solubility.to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub(crate) struct PredictionRow {
    #[serde(default)]
    pub mu: Option<f64>,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub gap: Option<f64>,
    #[serde(rename = "Cv", alias = "cv", default)]
    pub cv: Option<f64>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub(crate) enum TopCandidate {
    Entry { smiles: Option<String> },
    Bare(String),
}

impl TopCandidate {
    fn smiles(&self) -> Option<&str> {
        match self {
            Self::Entry { smiles } => smiles.as_deref(),
            Self::Bare(s) => Some(s.as_str()),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub predictions: Vec<PredictionRow>,
    #[serde(default)]
    pub topk: Vec<TopCandidate>,
    #[serde(default)]
    pub explanations: Vec<Option<String>>,
}

fn usable_explanation(e: Option<&Option<String>>) -> Option<String> {
    let e = e?.as_deref()?.trim();
    if e.is_empty() || e.contains("failed") || e.contains("Error") {
        return None;
    }
    Some(e.to_string())
}

impl GenerateResponse {
    /// Pairs predictions with candidates; whichever list is shorter decides
    /// the count.
    pub(crate) fn into_compounds(self) -> Vec<Compound> {
        let count = self.predictions.len().min(self.topk.len());
        (0..count)
            .map(|i| {
                let p = &self.predictions[i];
                Compound {
                    name: format!("Molecule {}", i + 1),
                    formula: self.topk[i].smiles().unwrap_or("N/A").to_string(),
                    properties: PredictedProperties {
                        mu: p.mu.unwrap_or_default(),
                        alpha: p.alpha.unwrap_or_default(),
                        gap: p.gap.unwrap_or_default(),
                        cv: p.cv.unwrap_or_default(),
                    },
                    justification: usable_explanation(self.explanations.get(i))
                        .unwrap_or_else(canned_justification),
                }
            })
            .collect()
    }
}

/// Client of the remote molecule generation service.
#[derive(Clone, Debug)]
pub(crate) struct MoleculeClient {
    pub(crate) base_url: String,
}

impl MoleculeClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub async fn generate(&self, criteria: &Criteria) -> ApiResult<Vec<Compound>> {
        leptos::logging::log!("[api] generate {:?}", criteria);
        let client = reqwest::Client::new();
        let res = client
            .post(format!("{}/generate", self.base_url))
            .json(&GenerateRequest::from(criteria))
            .send()
            .await
            .map_err(ApiError::network)?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, body });
        }

        let data: GenerateResponse = res.json().await.map_err(ApiError::parse)?;
        Ok(data.into_compounds())
    }

    pub async fn health(&self) -> ServiceHealth {
        let res = reqwest::Client::new()
            .get(format!("{}/health", self.base_url))
            .send()
            .await;
        match res {
            Ok(r) if r.status().is_success() => ServiceHealth::Healthy,
            Ok(r) => ServiceHealth::Unhealthy(format!("health check failed ({})", r.status())),
            Err(e) => ServiceHealth::Unhealthy(e.to_string()),
        }
    }
}

// ============================================================================
// Mock generator
// ============================================================================

const TEMPLATES: &[(&str, &str)] = &[
    ("Benzene", "C6H"),
    ("Ethanol", "C2H"),
    ("Acetone", "C3H"),
    ("Methane", "CH"),
    ("Propanol", "C3H"),
    ("Toluene", "C7H"),
    ("Hexane", "C6H"),
];

pub(crate) const DEFAULT_MOCK_COUNT: usize = 6;

/// Offline stand-in for the generation service.
#[derive(Clone, Debug)]
pub(crate) struct MockGenerator {
    pub count: usize,
    pub delay_ms: u32,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self {
            count: DEFAULT_MOCK_COUNT,
            delay_ms: 0,
        }
    }
}

fn in_range(lo: f64, hi: f64) -> f64 {
    round2(lo + random_unit() * (hi - lo))
}

impl MockGenerator {
    fn compound(index: usize) -> Compound {
        let (prefix, base) = TEMPLATES[index % TEMPLATES.len()];
        let variance = 1 + random_index(5);
        Compound {
            name: format!("{prefix} Derivative {}", index + 1),
            formula: format!("{base}{}O{variance}", 5 + variance),
            properties: PredictedProperties {
                mu: in_range(0.5, 5.0),
                alpha: in_range(50.0, 90.0),
                gap: in_range(0.1, 10.0),
                cv: in_range(20.0, 40.0),
            },
            justification: canned_justification(),
        }
    }

    pub async fn generate(&self, _criteria: &Criteria) -> ApiResult<Vec<Compound>> {
        sleep_ms(self.delay_ms).await;
        Ok((0..self.count).map(Self::compound).collect())
    }
}

/// The generator the discovery page talks to.
#[derive(Clone, Debug)]
pub(crate) enum CompoundSource {
    Remote(MoleculeClient),
    Mock(MockGenerator),
}

impl CompoundSource {
    pub fn from_config(config: &EnvConfig) -> Self {
        match (&config.molecule_api_url, config.use_mock_api) {
            (Some(url), false) => Self::Remote(MoleculeClient::new(url.clone())),
            _ => Self::Mock(MockGenerator {
                count: DEFAULT_MOCK_COUNT,
                delay_ms: config.mock_delay_ms,
            }),
        }
    }
}

impl CompoundGenerator for CompoundSource {
    async fn generate(&self, criteria: &Criteria) -> ApiResult<Vec<Compound>> {
        match self {
            Self::Remote(client) => client.generate(criteria).await,
            Self::Mock(mock) => mock.generate(criteria).await,
        }
    }

    async fn health(&self) -> ServiceHealth {
        match self {
            Self::Remote(client) => client.health().await,
            Self::Mock(_) => ServiceHealth::Mock,
        }
    }
}
