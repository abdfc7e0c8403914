use crate::core::io::reference::IONIC_RADIUS;
use crate::core::io::seeds::SeedMaterial;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Width of the Hume-Rothery size window, in percent of the target radius.
pub const HUME_ROTHERY_PERCENT: f64 = 15.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {parameter}: {message}")]
    InvalidValue {
        parameter: &'static str,
        message: String,
    },
}

/// How far a substitute's property may deviate from the value at the target site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PropertyWindow {
    /// `|v' - v| <= tolerance`, in the property's own unit (Å for radii).
    Absolute { tolerance: f64 },
    /// `[v - v·p/100, v + v·p/100]`.
    Relative { percent: f64 },
}

impl PropertyWindow {
    /// Largest accepted `|v' - v|` around `target`.
    pub fn half_width(&self, target: f64) -> f64 {
        match *self {
            Self::Absolute { tolerance } => tolerance,
            Self::Relative { percent } => (target * percent / 100.0).abs(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (parameter, value) = match *self {
            Self::Absolute { tolerance } => ("tolerance", tolerance),
            Self::Relative { percent } => ("percent", percent),
        };
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                parameter,
                message: format!("expected a non-negative number, got {}", value),
            })
        }
    }
}

impl Default for PropertyWindow {
    fn default() -> Self {
        Self::Relative {
            percent: HUME_ROTHERY_PERCENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceBound {
    #[default]
    Inclusive,
    Exclusive,
}

/// Relative slack at the window edge, so a decimal deviation equal to the
/// tolerance counts as on the edge.
const EDGE_EPSILON: f64 = 1e-9;

impl ToleranceBound {
    /// Whether `value` lies within `half_width` of `target`.
    pub fn admits(&self, value: f64, target: f64, half_width: f64) -> bool {
        let deviation = (value - target).abs();
        let eps = EDGE_EPSILON * half_width.abs().max(1.0);
        match self {
            Self::Inclusive => deviation <= half_width + eps,
            Self::Exclusive => deviation < half_width - eps,
        }
    }
}

impl FromStr for ToleranceBound {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Ok(Self::Inclusive),
            "exclusive" => Ok(Self::Exclusive),
            other => Err(ConfigError::InvalidValue {
                parameter: "bound",
                message: format!("expected 'inclusive' or 'exclusive', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ToleranceBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inclusive => write!(f, "inclusive"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Acceptance rules for an isovalent substitution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubstitutionCriteria {
    pub match_coordination: bool,
    pub property: String,
    pub bound: ToleranceBound,
    pub include_rejected: bool,
    pub window: PropertyWindow,
}

impl SubstitutionCriteria {
    /// Ionic-radius criteria with an absolute tolerance in Å.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            window: PropertyWindow::Absolute { tolerance },
            ..Self::default()
        }
    }
}

impl Default for SubstitutionCriteria {
    fn default() -> Self {
        Self {
            match_coordination: true,
            property: IONIC_RADIUS.to_string(),
            bound: ToleranceBound::default(),
            include_rejected: false,
            window: PropertyWindow::default(),
        }
    }
}

#[derive(Default)]
pub struct SubstitutionCriteriaBuilder {
    match_coordination: Option<bool>,
    property: Option<String>,
    window: Option<PropertyWindow>,
    bound: Option<ToleranceBound>,
    include_rejected: Option<bool>,
}

impl SubstitutionCriteriaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_coordination(mut self, enabled: bool) -> Self {
        self.match_coordination = Some(enabled);
        self
    }
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.property = Some(name.into());
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.window = Some(PropertyWindow::Absolute { tolerance });
        self
    }
    pub fn percent(mut self, percent: f64) -> Self {
        self.window = Some(PropertyWindow::Relative { percent });
        self
    }
    pub fn window(mut self, window: PropertyWindow) -> Self {
        self.window = Some(window);
        self
    }
    pub fn bound(mut self, bound: ToleranceBound) -> Self {
        self.bound = Some(bound);
        self
    }
    pub fn include_rejected(mut self, enabled: bool) -> Self {
        self.include_rejected = Some(enabled);
        self
    }

    /// Unset fields fall back to [`SubstitutionCriteria::default`].
    pub fn build(self) -> Result<SubstitutionCriteria, ConfigError> {
        let defaults = SubstitutionCriteria::default();
        let property = self.property.unwrap_or(defaults.property);
        if property.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "property",
                message: "property name must not be empty".to_string(),
            });
        }
        let window = self.window.unwrap_or(defaults.window);
        window.validate()?;

        Ok(SubstitutionCriteria {
            match_coordination: self
                .match_coordination
                .unwrap_or(defaults.match_coordination),
            property,
            bound: self.bound.unwrap_or(defaults.bound),
            include_rejected: self.include_rejected.unwrap_or(defaults.include_rejected),
            window,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatioSource {
    /// The built-in perovskite-family ratio list.
    #[default]
    Builtin,
    /// Ratios of every entry in the known-materials table.
    KnownMaterials,
}

impl FromStr for RatioSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "builtin" | "perovskite" => Ok(Self::Builtin),
            "known-materials" | "known" => Ok(Self::KnownMaterials),
            other => Err(ConfigError::InvalidValue {
                parameter: "source",
                message: format!("expected 'builtin' or 'known-materials', got '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoichiometryConfig {
    pub source: RatioSource,
    pub order_sensitive: bool,
}

impl Default for StoichiometryConfig {
    fn default() -> Self {
        Self {
            source: RatioSource::Builtin,
            order_sensitive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub candidates_path: PathBuf,
    pub known_materials_path: Option<PathBuf>,
    pub stoichiometry: StoichiometryConfig,
}

#[derive(Default)]
pub struct ScreenConfigBuilder {
    candidates_path: Option<PathBuf>,
    known_materials_path: Option<PathBuf>,
    source: Option<RatioSource>,
    order_sensitive: Option<bool>,
}

impl ScreenConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates_path(mut self, path: PathBuf) -> Self {
        self.candidates_path = Some(path);
        self
    }
    pub fn known_materials_path(mut self, path: Option<PathBuf>) -> Self {
        self.known_materials_path = path;
        self
    }
    pub fn source(mut self, source: RatioSource) -> Self {
        self.source = Some(source);
        self
    }
    pub fn order_sensitive(mut self, enabled: bool) -> Self {
        self.order_sensitive = Some(enabled);
        self
    }

    pub fn build(self) -> Result<ScreenConfig, ConfigError> {
        let defaults = StoichiometryConfig::default();
        let stoichiometry = StoichiometryConfig {
            source: self.source.unwrap_or(defaults.source),
            order_sensitive: self.order_sensitive.unwrap_or(defaults.order_sensitive),
        };
        if stoichiometry.source == RatioSource::KnownMaterials && self.known_materials_path.is_none() {
            return Err(ConfigError::MissingParameter("known_materials_path"));
        }
        Ok(ScreenConfig {
            candidates_path: self
                .candidates_path
                .ok_or(ConfigError::MissingParameter("candidates_path"))?,
            known_materials_path: self.known_materials_path,
            stoichiometry,
        })
    }
}

/// Where the generate workflow takes its seeds from.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedSource {
    Inline(Vec<SeedMaterial>),
    Table(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateConfig {
    pub reference_table_path: PathBuf,
    pub known_materials_path: Option<PathBuf>,
    pub seeds: SeedSource,
    pub criteria: SubstitutionCriteria,
}

#[derive(Default)]
pub struct GenerateConfigBuilder {
    reference_table_path: Option<PathBuf>,
    known_materials_path: Option<PathBuf>,
    seeds: Option<SeedSource>,
    criteria: Option<SubstitutionCriteria>,
}

impl GenerateConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference_table_path(mut self, path: PathBuf) -> Self {
        self.reference_table_path = Some(path);
        self
    }
    pub fn known_materials_path(mut self, path: Option<PathBuf>) -> Self {
        self.known_materials_path = path;
        self
    }
    pub fn seeds(mut self, seeds: SeedSource) -> Self {
        self.seeds = Some(seeds);
        self
    }
    pub fn criteria(mut self, criteria: SubstitutionCriteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn build(self) -> Result<GenerateConfig, ConfigError> {
        let seeds = self.seeds.ok_or(ConfigError::MissingParameter("seeds"))?;
        if let SeedSource::Inline(list) = &seeds {
            if list.is_empty() {
                return Err(ConfigError::MissingParameter("seeds"));
            }
        }
        Ok(GenerateConfig {
            reference_table_path: self
                .reference_table_path
                .ok_or(ConfigError::MissingParameter("reference_table_path"))?,
            known_materials_path: self.known_materials_path,
            seeds,
            criteria: self.criteria.unwrap_or_default(),
        })
    }
}
