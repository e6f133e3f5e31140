//! Chart data preparer: one `(name, value)` table per dimension.

use crate::config::Settings;
use crate::stats::compute_statistics;
use crate::types::{ChartData, LawyerRecord, NameCount, Statistics};
use crate::util::value_counts;
use chrono::Datelike;

pub const EXPERIENCE_LABELS: [&str; 4] = [
    "Débutants (0–5)",
    "Confirmés (6–15)",
    "Experts (16–25)",
    "Séniors (25+)",
];

fn to_table<'a, I>(items: I, limit: Option<usize>) -> Vec<NameCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = value_counts(items);
    let take = limit.unwrap_or(counts.len());
    counts
        .into_iter()
        .take(take)
        .map(|(name, value)| NameCount::new(name, value))
        .collect()
}

pub fn barreau_chart(data: &[LawyerRecord], top_n: usize) -> Vec<NameCount> {
    to_table(data.iter().filter_map(|r| r.barreau.as_deref()), Some(top_n))
}

/// One count per occurrence: a lawyer listing the same language twice
/// counts twice.
pub fn langues_chart(data: &[LawyerRecord], top_n: usize) -> Vec<NameCount> {
    to_table(
        data.iter().flat_map(|r| r.langues.iter().map(String::as_str)),
        Some(top_n),
    )
}

pub fn specialisations_chart(data: &[LawyerRecord]) -> Vec<NameCount> {
    to_table(
        data.iter().flat_map(|r| r.specialisations.iter().map(String::as_str)),
        None,
    )
}

pub fn activites_chart(data: &[LawyerRecord]) -> Vec<NameCount> {
    to_table(
        data.iter()
            .flat_map(|r| r.activites_dominantes.iter().map(String::as_str)),
        None,
    )
}

/// Four fixed buckets `[0,5) [5,15) [15,25) [25,max+1)`. All four rows are
/// always present.
pub fn experience_chart(data: &[LawyerRecord]) -> Vec<NameCount> {
    let max_exp = data.iter().map(|r| r.annees_experience).max().unwrap_or(0);
    let bounds = [0, 5, 15, 25, max_exp + 1];
    let mut counts = [0usize; 4];
    for r in data {
        let exp = r.annees_experience;
        if let Some(i) = (0..4).find(|&i| exp >= bounds[i] && exp < bounds[i + 1]) {
            counts[i] += 1;
        }
    }
    EXPERIENCE_LABELS
        .iter()
        .zip(counts)
        .map(|(label, value)| NameCount::new(*label, value))
        .collect()
}

pub fn gender_chart(data: &[LawyerRecord]) -> Vec<NameCount> {
    to_table(data.iter().map(|r| r.gender.label()), None)
}

/// Admissions per oath year within `[year_min, year_max]`, oldest first.
pub fn flux_entree_chart(data: &[LawyerRecord], year_min: i32, year_max: i32) -> Vec<NameCount> {
    let mut years: Vec<(i32, usize)> =
        value_counts(data.iter().filter_map(|r| r.date_prestation_serment.map(|d| d.year())))
            .into_iter()
            .filter(|(y, _)| (year_min..=year_max).contains(y))
            .collect();
    years.sort_by_key(|(y, _)| *y);
    years
        .into_iter()
        .map(|(y, value)| NameCount::new(y.to_string(), value))
        .collect()
}

pub fn prepare_chart_data(data: &[LawyerRecord], settings: &Settings) -> ChartData {
    ChartData {
        barreau: barreau_chart(data, settings.top_n),
        langues: langues_chart(data, settings.top_n),
        specialisations: specialisations_chart(data),
        activites_dominantes: activites_chart(data),
        experience: experience_chart(data),
        gender: gender_chart(data),
        flux_entree: flux_entree_chart(data, settings.flow_year_min, settings.flow_year_max),
    }
}

pub fn top_cities(data: &[LawyerRecord], n: usize) -> Vec<NameCount> {
    to_table(data.iter().filter_map(|r| r.ville.as_deref()), Some(n))
}

/// Most frequent postal codes, cut to their first five characters.
pub fn top_postal_codes(data: &[LawyerRecord], n: usize) -> Vec<NameCount> {
    let prefixes: Vec<String> = data
        .iter()
        .filter_map(|r| r.code_postal.as_deref())
        .map(|cp| cp.chars().take(5).collect())
        .collect();
    to_table(prefixes.iter().map(String::as_str), Some(n))
}

/// Sorted distinct bar associations, preceded by the "all" choice.
pub fn barreau_choices(data: &[LawyerRecord]) -> Vec<String> {
    let mut bars: Vec<String> = data.iter().filter_map(|r| r.barreau.clone()).collect();
    bars.sort();
    bars.dedup();
    let mut choices = vec![ALL_BARREAUX.to_string()];
    choices.extend(bars);
    choices
}

pub const ALL_BARREAUX: &str = "Tous";

/// New subset restricted to one bar association; `Tous` keeps every row.
pub fn filter_by_barreau(data: &[LawyerRecord], selection: &str) -> Vec<LawyerRecord> {
    if selection == ALL_BARREAUX {
        return data.to_vec();
    }
    data.iter()
        .filter(|r| r.barreau.as_deref() == Some(selection))
        .cloned()
        .collect()
}

/// The three narrative lines shown under the KPIs.
pub fn insights(stats: &Statistics) -> Vec<String> {
    vec![
        format!(
            "Diversification : {:.1} % ont plusieurs spécialisations.",
            stats.diversite_specialisation
        ),
        format!(
            "Internationalisation : {:.1} % maîtrisent au moins une langue étrangère.",
            stats.diversite_linguistique
        ),
        format!(
            "Renouvellement : {:.1} % sont de jeunes diplômés (≤ 5 ans).",
            stats.taux_renouvellement
        ),
    ]
}

/// Statistics and charts for one bar selection, computed from the full table.
pub fn dashboard(data: &[LawyerRecord], selection: &str, settings: &Settings) -> (Statistics, ChartData) {
    let subset = filter_by_barreau(data, selection);
    (compute_statistics(&subset), prepare_chart_data(&subset, settings))
}
