//! Field normalizer: raw registry rows to [`LawyerRecord`]s.
//!
//! Nothing in here fails. Unreadable cells degrade to an empty list, zero
//! experience, a missing age, or an undetermined gender.
//!
//! Missing oath dates are handled two ways on purpose: experience falls back
//! to 0 while seniority and age stay missing. Unifying them would change the
//! published statistics.

use crate::config::Settings;
use crate::gender::{gender_of_full_name, GenderDetector};
use crate::types::{AgeBracket, Gender, LawyerRecord, RawRow, RawValue};
use crate::util::{parse_date_safe, years_since};
use chrono::NaiveDate;
use log::debug;

const DAYS_PER_YEAR: f64 = 365.25;
const SOLO_PRACTICE_MARKER: &str = "Individuel";

/// Parse the free-text language column.
///
/// `"['Anglais', 'Espagnol']"` and `"Anglais, Espagnol"` both give
/// `["Anglais", "Espagnol"]`. The national language is dropped whatever its
/// case; duplicates are kept.
pub fn parse_langues(v: &RawValue, national_language: &str) -> Vec<String> {
    let langs: Vec<String> = match v {
        RawValue::List(items) => items.clone(),
        RawValue::Text(s) if !s.is_empty() => s
            .replace(['[', ']', '\'', '"'], "")
            .split(',')
            .map(|l| l.trim().to_string())
            .collect(),
        _ => Vec::new(),
    };
    let national = national_language.to_lowercase();
    langs
        .into_iter()
        .filter(|l| !l.is_empty() && l.to_lowercase() != national)
        .collect()
}

/// Keep the text slots that are not blank, in slot order.
pub fn parse_slots(slots: &[RawValue]) -> Vec<String> {
    slots
        .iter()
        .filter_map(|v| v.as_text())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Any filled structure reference counts, except blank ones and explicit
/// solo-practice markers.
pub fn in_structure(v: &RawValue) -> bool {
    match v {
        RawValue::Empty => false,
        RawValue::Text(s) => match s.split_whitespace().next() {
            Some(first) => first != SOLO_PRACTICE_MARKER,
            None => false,
        },
        _ => true,
    }
}

/// Presence check: a whitespace-only slot still counts.
pub fn is_specialised(slots: &[RawValue]) -> bool {
    slots.iter().any(|v| !v.is_empty())
}

pub fn seniority_years(oath: Option<NaiveDate>, today: NaiveDate) -> Option<f64> {
    oath.map(|d| (today - d).num_days() as f64 / DAYS_PER_YEAR)
}

pub struct Normalizer<'a, D: GenderDetector + ?Sized> {
    detector: &'a D,
    settings: &'a Settings,
    today: NaiveDate,
}

impl<'a, D: GenderDetector + ?Sized> Normalizer<'a, D> {
    pub fn new(detector: &'a D, settings: &'a Settings) -> Self {
        Normalizer {
            detector,
            settings,
            today: settings.today(),
        }
    }

    pub fn normalize_row(&self, row: &RawRow) -> LawyerRecord {
        let nom_complet = row.nom_complet.to_display().unwrap_or_default();
        let oath = parse_date_safe(&row.date_prestation_serment);
        let seniority = seniority_years(oath, self.today);
        let age_est = seniority.map(|s| s + self.settings.oath_age);

        LawyerRecord {
            gender: gender_of_full_name(self.detector, &nom_complet),
            nom_complet,
            barreau: row.barreau.to_display(),
            ville: row.ville.to_display(),
            code_postal: row.code_postal.to_display(),
            structure_reference: row.structure_reference.to_display(),
            date_prestation_serment: oath,
            langues: parse_langues(&row.langues, &self.settings.national_language),
            specialisations: parse_slots(&row.specialisations),
            activites_dominantes: parse_slots(&row.activites_dominantes),
            annees_experience: years_since(oath, self.today),
            seniority_years: seniority,
            age_est,
            age_bracket: age_est.and_then(AgeBracket::from_age),
            in_structure: in_structure(&row.structure_reference),
            is_specialised: is_specialised(&row.specialisations),
        }
    }

    pub fn process(&self, rows: &[RawRow]) -> Vec<LawyerRecord> {
        let records: Vec<LawyerRecord> = rows.iter().map(|r| self.normalize_row(r)).collect();
        let undated = records
            .iter()
            .filter(|r| r.date_prestation_serment.is_none())
            .count();
        let unknown = records
            .iter()
            .filter(|r| r.gender == Gender::Unknown)
            .count();
        debug!(
            "normalized {} rows ({} without a usable oath date, {} with undetermined gender)",
            records.len(),
            undated,
            unknown
        );
        records
    }
}

/// Normalize a whole table in one call.
pub fn process_data<D: GenderDetector + ?Sized>(
    rows: &[RawRow],
    detector: &D,
    settings: &Settings,
) -> Vec<LawyerRecord> {
    Normalizer::new(detector, settings).process(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gender::{NameDictionary, NameGender};

    fn settings() -> Settings {
        Settings {
            reference_date: NaiveDate::from_ymd_opt(2025, 7, 1),
            ..Settings::default()
        }
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn languages_from_bracketed_text() {
        let langs = parse_langues(&text("['Anglais', 'Français']"), "Français");
        assert_eq!(langs, vec!["Anglais"]);
    }

    #[test]
    fn languages_keep_duplicates_and_drop_national_case_insensitively() {
        let langs = parse_langues(&text("Anglais, FRANÇAIS, Anglais ,  , Arabe"), "Français");
        assert_eq!(langs, vec!["Anglais", "Anglais", "Arabe"]);
    }

    #[test]
    fn languages_from_list_and_missing() {
        let list = RawValue::List(vec!["Italien".into(), "français".into()]);
        assert_eq!(parse_langues(&list, "Français"), vec!["Italien"]);
        assert!(parse_langues(&RawValue::Empty, "Français").is_empty());
        assert!(parse_langues(&text(""), "Français").is_empty());
        assert!(parse_langues(&RawValue::Number(3.0), "Français").is_empty());
    }

    #[test]
    fn slots_keep_non_blank_text_in_order() {
        let slots = [text("Droit fiscal"), text("   "), text("Droit social")];
        assert_eq!(parse_slots(&slots), vec!["Droit fiscal", "Droit social"]);
        let slots = [RawValue::Empty, RawValue::Number(4.0), text("Droit pénal")];
        assert_eq!(parse_slots(&slots), vec!["Droit pénal"]);
    }

    #[test]
    fn specialised_is_a_presence_check() {
        let blank = [text("  "), RawValue::Empty, RawValue::Empty];
        assert!(is_specialised(&blank));
        assert!(parse_slots(&blank).is_empty());
        let none = [RawValue::Empty, RawValue::Empty, RawValue::Empty];
        assert!(!is_specialised(&none));
    }

    #[test]
    fn structure_membership() {
        assert!(in_structure(&text("SELARL Dupont & Associés")));
        assert!(!in_structure(&text("Individuel")));
        assert!(!in_structure(&text("Individuel - cabinet")));
        assert!(!in_structure(&text("   ")));
        assert!(!in_structure(&RawValue::Empty));
        assert!(in_structure(&RawValue::Number(12345.0)));
    }

    #[test]
    fn experience_and_age_from_oath_date() {
        let detector = NameDictionary::bundled(true);
        let s = settings();
        let n = Normalizer::new(&detector, &s);
        let row = RawRow {
            nom_complet: text("Claire MARTIN"),
            date_prestation_serment: text("2005-07-01"),
            ..RawRow::default()
        };
        let rec = n.normalize_row(&row);
        assert_eq!(rec.annees_experience, 20);
        let seniority = rec.seniority_years.unwrap();
        assert!((seniority - 7305.0 / 365.25).abs() < 1e-9);
        assert!((rec.age_est.unwrap() - (seniority + 27.0)).abs() < 1e-9);
        assert_eq!(rec.age_bracket, Some(AgeBracket::Forties));
        assert_eq!(rec.gender, Gender::Female);
    }

    #[test]
    fn missing_date_gives_zero_experience_but_no_age() {
        let detector = NameDictionary::new(true);
        let s = settings();
        let n = Normalizer::new(&detector, &s);
        let row = RawRow {
            nom_complet: text("X Y"),
            date_prestation_serment: text("pas de date"),
            ..RawRow::default()
        };
        let rec = n.normalize_row(&row);
        assert_eq!(rec.annees_experience, 0);
        assert_eq!(rec.seniority_years, None);
        assert_eq!(rec.age_est, None);
        assert_eq!(rec.age_bracket, None);
        assert_eq!(rec.gender, Gender::Unknown);
    }

    #[test]
    fn workbook_date_cells_are_used_directly() {
        let detector = NameDictionary::new(true);
        let s = settings();
        let dt = NaiveDate::from_ymd_opt(1990, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let row = RawRow {
            date_prestation_serment: RawValue::DateTime(dt),
            ..RawRow::default()
        };
        let rec = Normalizer::new(&detector, &s).normalize_row(&row);
        assert_eq!(rec.annees_experience, 35);
        assert_eq!(rec.age_bracket, Some(AgeBracket::SixtyPlus));
    }

    #[test]
    fn gender_detector_is_injected() {
        let mut detector = NameDictionary::new(true);
        detector.insert("Andy", NameGender::Female);
        let s = settings();
        let rows = vec![RawRow {
            nom_complet: text("Andy-Claude DURAND"),
            ..RawRow::default()
        }];
        let recs = process_data(&rows, &detector, &s);
        assert_eq!(recs[0].gender, Gender::Female);
    }

    #[test]
    fn carries_categorical_fields() {
        let detector = NameDictionary::new(true);
        let s = settings();
        let row = RawRow {
            barreau: text("Paris"),
            ville: text("Paris"),
            code_postal: RawValue::Number(75008.0),
            specialisations: [text("Droit fiscal"), text("Droit des sociétés"), RawValue::Empty],
            activites_dominantes: [RawValue::Empty, text("Conseil"), RawValue::Empty],
            ..RawRow::default()
        };
        let rec = Normalizer::new(&detector, &s).normalize_row(&row);
        assert_eq!(rec.barreau.as_deref(), Some("Paris"));
        assert_eq!(rec.code_postal.as_deref(), Some("75008"));
        assert_eq!(rec.specialisations.len(), 2);
        assert_eq!(rec.activites_dominantes, vec!["Conseil"]);
        assert!(rec.is_specialised);
        assert!(!rec.in_structure);
    }
}
