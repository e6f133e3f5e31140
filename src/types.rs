use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

/// A single spreadsheet cell, as close to what the file held as possible.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Already-split values (e.g. languages coming from a structured source).
    List(Vec<String>),
}

impl RawValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, RawValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render a present value the way a dataframe would print it; `None` for
    /// missing cells.
    pub fn to_display(&self) -> Option<String> {
        match self {
            RawValue::Empty => None,
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            RawValue::List(items) => Some(items.join(", ")),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// One registry row before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub nom_complet: RawValue,
    pub barreau: RawValue,
    pub ville: RawValue,
    pub code_postal: RawValue,
    pub structure_reference: RawValue,
    pub date_prestation_serment: RawValue,
    pub langues: RawValue,
    pub specialisations: [RawValue; 3],
    pub activites_dominantes: [RawValue; 3],
}

impl Default for RawRow {
    fn default() -> Self {
        RawRow {
            nom_complet: RawValue::Empty,
            barreau: RawValue::Empty,
            ville: RawValue::Empty,
            code_postal: RawValue::Empty,
            structure_reference: RawValue::Empty,
            date_prestation_serment: RawValue::Empty,
            langues: RawValue::Empty,
            specialisations: [RawValue::Empty, RawValue::Empty, RawValue::Empty],
            activites_dominantes: [RawValue::Empty, RawValue::Empty, RawValue::Empty],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "?",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Estimated-age brackets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBracket {
    Under30,
    Thirties,
    Forties,
    Fifties,
    SixtyPlus,
}

impl AgeBracket {
    pub fn label(self) -> &'static str {
        match self {
            AgeBracket::Under30 => "<30",
            AgeBracket::Thirties => "30-39",
            AgeBracket::Forties => "40-49",
            AgeBracket::Fifties => "50-59",
            AgeBracket::SixtyPlus => "60+",
        }
    }

    /// Right-closed bins `(0,30] (30,40] (40,50] (50,60] (60,inf)`. Ages that
    /// are not strictly positive (or NaN) fall outside every bin.
    pub fn from_age(age: f64) -> Option<AgeBracket> {
        if age.is_nan() || age <= 0.0 {
            None
        } else if age <= 30.0 {
            Some(AgeBracket::Under30)
        } else if age <= 40.0 {
            Some(AgeBracket::Thirties)
        } else if age <= 50.0 {
            Some(AgeBracket::Forties)
        } else if age <= 60.0 {
            Some(AgeBracket::Fifties)
        } else {
            Some(AgeBracket::SixtyPlus)
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AgeBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A registry row after normalization. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LawyerRecord {
    pub nom_complet: String,
    pub barreau: Option<String>,
    pub ville: Option<String>,
    pub code_postal: Option<String>,
    pub structure_reference: Option<String>,
    pub date_prestation_serment: Option<NaiveDate>,
    pub langues: Vec<String>,
    pub specialisations: Vec<String>,
    pub activites_dominantes: Vec<String>,
    pub annees_experience: u32,
    pub seniority_years: Option<f64>,
    pub age_est: Option<f64>,
    pub age_bracket: Option<AgeBracket>,
    pub gender: Gender,
    pub in_structure: bool,
    pub is_specialised: bool,
}

/// Generic two-column chart table row.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct NameCount {
    #[serde(rename = "name")]
    #[tabled(rename = "name")]
    pub name: String,
    #[serde(rename = "value")]
    #[tabled(rename = "value")]
    pub value: usize,
}

impl NameCount {
    pub fn new(name: impl Into<String>, value: usize) -> Self {
        NameCount {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct StructureByAgeRow {
    #[serde(rename = "age_bracket")]
    #[tabled(rename = "Tranche d'âge")]
    pub age_bracket: AgeBracket,
    #[serde(rename = "Solo")]
    #[tabled(rename = "Solo")]
    pub solo: usize,
    #[serde(rename = "Structure")]
    #[tabled(rename = "Structure")]
    pub structure: usize,
    #[serde(rename = "% Structure")]
    #[tabled(rename = "% Structure")]
    pub pct_structure: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct SpecialisationByAgeRow {
    #[serde(rename = "age_bracket")]
    #[tabled(rename = "Tranche d'âge")]
    pub age_bracket: AgeBracket,
    #[serde(rename = "Non spé")]
    #[tabled(rename = "Non spé")]
    pub non_specialises: usize,
    #[serde(rename = "Spécialisés")]
    #[tabled(rename = "Spécialisés")]
    pub specialises: usize,
    #[serde(rename = "% Spécialisés")]
    #[tabled(rename = "% Spécialisés")]
    pub pct_specialises: f64,
}

/// The flat KPI mapping. Field names are the metric names used in exports.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Statistics {
    pub total: usize,
    pub avg_exp: f64,
    pub unique_barreaux: usize,
    pub unique_cities: usize,
    pub diversite_linguistique: f64,
    pub diversite_specialisation: f64,
    pub taux_expertise: f64,
    pub taux_renouvellement: f64,
    pub concentration_geo: f64,
    pub pct_no_specialisation: f64,
    pub pct_monolingues: f64,
    pub pct_pre_retraite: f64,
    pub shannon_specialisations: f64,
    pub gini_barreaux: f64,
    pub pct_top3_barreaux: f64,
    pub pct_anciens: f64,
    pub multilingues: usize,
    pub multispecialistes: usize,
    pub experts_confirmes: usize,
    pub jeunes_diplomes: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MetricRow {
    #[serde(rename = "metric")]
    #[tabled(rename = "Indicateur")]
    pub metric: &'static str,
    #[serde(rename = "value")]
    #[tabled(rename = "Valeur")]
    pub value: String,
}

impl Statistics {
    /// `(metric name, rendered value)` in a fixed display order.
    pub fn entries(&self) -> Vec<MetricRow> {
        let row = |metric: &'static str, value: String| MetricRow { metric, value };
        vec![
            row("total", self.total.to_string()),
            row("avg_exp", format!("{:.1}", self.avg_exp)),
            row("unique_barreaux", self.unique_barreaux.to_string()),
            row("unique_cities", self.unique_cities.to_string()),
            row("diversite_linguistique", format!("{:.1}", self.diversite_linguistique)),
            row("diversite_specialisation", format!("{:.1}", self.diversite_specialisation)),
            row("taux_expertise", format!("{:.1}", self.taux_expertise)),
            row("taux_renouvellement", format!("{:.1}", self.taux_renouvellement)),
            row("concentration_geo", format!("{:.1}", self.concentration_geo)),
            row("pct_no_specialisation", format!("{:.1}", self.pct_no_specialisation)),
            row("pct_monolingues", format!("{:.1}", self.pct_monolingues)),
            row("pct_pre_retraite", format!("{:.1}", self.pct_pre_retraite)),
            row("shannon_specialisations", format!("{:.2}", self.shannon_specialisations)),
            row("gini_barreaux", format!("{:.3}", self.gini_barreaux)),
            row("pct_top3_barreaux", format!("{:.1}", self.pct_top3_barreaux)),
            row("pct_anciens", format!("{:.1}", self.pct_anciens)),
            row("multilingues", self.multilingues.to_string()),
            row("multispecialistes", self.multispecialistes.to_string()),
            row("experts_confirmes", self.experts_confirmes.to_string()),
            row("jeunes_diplomes", self.jeunes_diplomes.to_string()),
        ]
    }
}

/// The two age cross-tabs.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct AgeInsights {
    pub structure: Vec<StructureByAgeRow>,
    pub specialisation: Vec<SpecialisationByAgeRow>,
}

/// Per-dimension chart tables.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct ChartData {
    pub barreau: Vec<NameCount>,
    pub langues: Vec<NameCount>,
    pub specialisations: Vec<NameCount>,
    pub activites_dominantes: Vec<NameCount>,
    pub experience: Vec<NameCount>,
    pub gender: Vec<NameCount>,
    pub flux_entree: Vec<NameCount>,
}
