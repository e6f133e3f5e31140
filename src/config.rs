use crate::error::{Result, StatsError};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Pipeline settings. Every field has a default so a config file only needs
/// the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Language every lawyer is assumed to speak; excluded from `langues`.
    pub national_language: String,
    /// Assumed average age at oath-taking, added to seniority.
    pub oath_age: f64,
    pub flow_year_min: i32,
    pub flow_year_max: i32,
    /// Rows kept in the bar-association and language charts.
    pub top_n: usize,
    /// Date experience and seniority are measured against. Today if unset.
    pub reference_date: Option<NaiveDate>,
    pub case_sensitive_names: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            national_language: "Français".to_string(),
            oath_age: 27.0,
            flow_year_min: 1990,
            flow_year_max: 2024,
            top_n: 8,
            reference_date: None,
            case_sensitive_names: true,
        }
    }
}

impl Settings {
    pub fn from_json_file(path: &Path) -> Result<Settings> {
        let s = fs::read_to_string(path)
            .map_err(|e| StatsError::io(path.display().to_string(), e))?;
        let settings: Settings = serde_json::from_str(&s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.flow_year_min > self.flow_year_max {
            return Err(StatsError::Config(format!(
                "flow_year_min ({}) is after flow_year_max ({})",
                self.flow_year_min, self.flow_year_max
            )));
        }
        if self.oath_age.is_nan() || self.oath_age < 0.0 {
            return Err(StatsError::Config(format!(
                "oath_age must be a non-negative number, got {}",
                self.oath_age
            )));
        }
        if self.top_n == 0 {
            return Err(StatsError::Config("top_n must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Stable textual form of everything that changes normalization output,
    /// used as part of the cache key.
    pub fn normalization_fingerprint(&self) -> String {
        format!(
            "lang={};oath_age={};today={};case={}",
            self.national_language,
            self.oath_age,
            self.today(),
            self.case_sensitive_names
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"top_n": 5, "reference_date": "2025-01-01"}}"#).unwrap();
        let s = Settings::from_json_file(f.path()).unwrap();
        assert_eq!(s.top_n, 5);
        assert_eq!(s.national_language, "Français");
        assert_eq!(s.flow_year_min, 1990);
        assert_eq!(s.today(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn rejects_inverted_year_range() {
        let s = Settings {
            flow_year_min: 2024,
            flow_year_max: 1990,
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(StatsError::Config(_))));
    }

    #[test]
    fn rejects_zero_top_n_and_nan_age() {
        let s = Settings {
            top_n: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
        let s = Settings {
            oath_age: f64::NAN,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn fingerprint_tracks_normalization_inputs() {
        let a = Settings {
            reference_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Settings::default()
        };
        let b = Settings {
            top_n: 3,
            ..a.clone()
        };
        let c = Settings {
            national_language: "English".to_string(),
            ..a.clone()
        };
        assert_eq!(a.normalization_fingerprint(), b.normalization_fingerprint());
        assert_ne!(a.normalization_fingerprint(), c.normalization_fingerprint());
    }
}
