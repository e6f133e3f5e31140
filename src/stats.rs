//! Statistics aggregator: KPIs, concentration and diversity indices, and
//! the two age cross-tabs.

use crate::types::{
    AgeBracket, AgeInsights, LawyerRecord, SpecialisationByAgeRow, Statistics, StructureByAgeRow,
};
use crate::util::{average, percent, round_to, value_counts};
use std::collections::{BTreeMap, HashSet};

/// Gini coefficient of a vector of counts: `sum |xi - xj| / (2 n^2 mean)`
/// over every ordered pair. 0 for an empty vector or a zero mean.
pub fn gini(counts: &[usize]) -> f64 {
    let n = counts.len();
    if n == 0 {
        return 0.0;
    }
    let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    let mean = average(&values);
    if mean == 0.0 {
        return 0.0;
    }
    let diffs: f64 = values
        .iter()
        .map(|xi| values.iter().map(|xj| (xi - xj).abs()).sum::<f64>())
        .sum();
    diffs / (2.0 * (n * n) as f64 * mean)
}

/// Base-2 Shannon entropy of a frequency distribution.
pub fn shannon_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// Herfindahl index of category shares, scaled to 0..100. Shares are taken
/// against `total`, which may exceed the number of categorized rows.
pub fn herfindahl(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .map(|&c| {
            let share = c as f64 / total as f64;
            share * share
        })
        .sum::<f64>()
        * 100.0
}

fn counts_only<T>(vc: Vec<(T, usize)>) -> Vec<usize> {
    vc.into_iter().map(|(_, c)| c).collect()
}

pub fn compute_statistics(data: &[LawyerRecord]) -> Statistics {
    let total = data.len();
    if total == 0 {
        return Statistics::default();
    }
    let count = |pred: fn(&LawyerRecord) -> bool| data.iter().filter(|r| pred(r)).count();

    let experience: Vec<f64> = data.iter().map(|r| r.annees_experience as f64).collect();
    let unique_barreaux: HashSet<&str> = data.iter().filter_map(|r| r.barreau.as_deref()).collect();
    let unique_cities: HashSet<&str> = data.iter().filter_map(|r| r.ville.as_deref()).collect();

    let multilingues = count(|r| !r.langues.is_empty());
    let multispecialistes = count(|r| r.specialisations.len() > 1);
    let experts_confirmes = count(|r| r.annees_experience > 15);
    let jeunes_diplomes = count(|r| r.annees_experience <= 5);
    let no_spec = count(|r| r.specialisations.is_empty());
    let mono = count(|r| r.langues.is_empty());
    let near_retirement = count(|r| r.annees_experience >= 35);
    let anciens = count(|r| r.annees_experience > 30);

    let cities = counts_only(value_counts(data.iter().filter_map(|r| r.ville.as_deref())));
    let specs = counts_only(value_counts(
        data.iter().flat_map(|r| r.specialisations.iter().map(String::as_str)),
    ));
    let bars = counts_only(value_counts(data.iter().filter_map(|r| r.barreau.as_deref())));
    let top3: usize = bars.iter().take(3).sum();

    Statistics {
        total,
        avg_exp: round_to(average(&experience), 1),
        unique_barreaux: unique_barreaux.len(),
        unique_cities: unique_cities.len(),
        diversite_linguistique: round_to(percent(multilingues, total), 1),
        diversite_specialisation: round_to(percent(multispecialistes, total), 1),
        taux_expertise: round_to(percent(experts_confirmes, total), 1),
        taux_renouvellement: round_to(percent(jeunes_diplomes, total), 1),
        concentration_geo: round_to(herfindahl(&cities, total), 1),
        pct_no_specialisation: round_to(percent(no_spec, total), 1),
        pct_monolingues: round_to(percent(mono, total), 1),
        pct_pre_retraite: round_to(percent(near_retirement, total), 1),
        shannon_specialisations: round_to(shannon_entropy(&specs), 2),
        gini_barreaux: round_to(gini(&bars), 3),
        pct_top3_barreaux: round_to(percent(top3, total), 1),
        pct_anciens: round_to(percent(anciens, total), 1),
        multilingues,
        multispecialistes,
        experts_confirmes,
        jeunes_diplomes,
    }
}

/// Age bracket by structure membership and by specialization. Rows without
/// an age bracket are left out; brackets with no rows are not emitted.
pub fn compute_age_insights(data: &[LawyerRecord]) -> AgeInsights {
    // bracket -> [(false, true) for in_structure, (false, true) for is_specialised]
    let mut by_bracket: BTreeMap<AgeBracket, [[usize; 2]; 2]> = BTreeMap::new();
    for r in data {
        let Some(bracket) = r.age_bracket else {
            continue;
        };
        let cell = by_bracket.entry(bracket).or_default();
        cell[0][r.in_structure as usize] += 1;
        cell[1][r.is_specialised as usize] += 1;
    }

    let mut insights = AgeInsights::default();
    for (age_bracket, [[solo, structure], [non_spe, spe]]) in by_bracket {
        insights.structure.push(StructureByAgeRow {
            age_bracket,
            solo,
            structure,
            pct_structure: round_to(percent(structure, solo + structure), 1),
        });
        insights.specialisation.push(SpecialisationByAgeRow {
            age_bracket,
            non_specialises: non_spe,
            specialises: spe,
            pct_specialises: round_to(percent(spe, non_spe + spe), 1),
        });
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;

    fn record() -> LawyerRecord {
        LawyerRecord {
            nom_complet: String::new(),
            barreau: None,
            ville: None,
            code_postal: None,
            structure_reference: None,
            date_prestation_serment: None,
            langues: vec![],
            specialisations: vec![],
            activites_dominantes: vec![],
            annees_experience: 0,
            seniority_years: None,
            age_est: None,
            age_bracket: None,
            gender: Gender::Unknown,
            in_structure: false,
            is_specialised: false,
        }
    }

    fn with_city(city: &str) -> LawyerRecord {
        LawyerRecord {
            ville: Some(city.to_string()),
            ..record()
        }
    }

    fn with_exp(years: u32) -> LawyerRecord {
        LawyerRecord {
            annees_experience: years,
            ..record()
        }
    }

    fn with_specs(specs: &[&str]) -> LawyerRecord {
        LawyerRecord {
            specialisations: specs.iter().map(|s| s.to_string()).collect(),
            ..record()
        }
    }

    fn percentages(s: &Statistics) -> [f64; 10] {
        [
            s.diversite_linguistique,
            s.diversite_specialisation,
            s.taux_expertise,
            s.taux_renouvellement,
            s.concentration_geo,
            s.pct_no_specialisation,
            s.pct_monolingues,
            s.pct_pre_retraite,
            s.pct_top3_barreaux,
            s.pct_anciens,
        ]
    }

    #[test]
    fn empty_input_is_all_zero() {
        let s = compute_statistics(&[]);
        assert_eq!(s, Statistics::default());
        let insights = compute_age_insights(&[]);
        assert!(insights.structure.is_empty());
        assert!(insights.specialisation.is_empty());
    }

    #[test]
    fn herfindahl_paris_lyon() {
        let data = vec![with_city("Paris"), with_city("Paris"), with_city("Lyon")];
        let s = compute_statistics(&data);
        assert_eq!(s.concentration_geo, 55.6);
        assert_eq!(s.unique_cities, 2);
    }

    #[test]
    fn herfindahl_extremes() {
        let one_city: Vec<_> = (0..10).map(|_| with_city("Nantes")).collect();
        assert_eq!(compute_statistics(&one_city).concentration_geo, 100.0);
        let spread: Vec<_> = (0..200).map(|i| with_city(&format!("V{i}"))).collect();
        assert_eq!(compute_statistics(&spread).concentration_geo, 0.5);
    }

    #[test]
    fn experience_thresholds() {
        let data: Vec<_> = [2, 8, 20, 40].into_iter().map(with_exp).collect();
        let s = compute_statistics(&data);
        assert_eq!(s.taux_expertise, 50.0);
        assert_eq!(s.experts_confirmes, 2);
        assert_eq!(s.pct_pre_retraite, 25.0);
        assert_eq!(s.pct_anciens, 25.0);
        assert_eq!(s.taux_renouvellement, 25.0);
        assert_eq!(s.jeunes_diplomes, 1);
        assert_eq!(s.avg_exp, 17.5);
    }

    #[test]
    fn experience_scenario_boundaries() {
        let data: Vec<_> = [2, 8, 15, 30].into_iter().map(with_exp).collect();
        let s = compute_statistics(&data);
        // 15 is not "> 15", 30 is not "> 30" nor ">= 35".
        assert_eq!(s.taux_expertise, 0.0);
        assert_eq!(s.pct_pre_retraite, 0.0);
        assert_eq!(s.pct_anciens, 0.0);
    }

    #[test]
    fn published_metrics_round_ties_to_even() {
        let mut data: Vec<_> = (0..15).map(|_| with_exp(1)).collect();
        data.push(with_exp(20));
        // 1 of 16 is 6.25 %.
        assert_eq!(compute_statistics(&data).taux_expertise, 6.2);

        let data: Vec<_> = [17, 17, 18, 17].into_iter().map(with_exp).collect();
        assert_eq!(compute_statistics(&data).avg_exp, 17.2);
    }

    #[test]
    fn gini_properties() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0, 0]), 0.0);
        assert_eq!(gini(&[5, 5, 5, 5]), 0.0);
        let g = gini(&[1, 1, 1, 97]);
        assert!(g > 0.0 && g < 1.0);
        // (|1-3| * 2) / (2 * 4 * 2) = 0.25
        assert!((gini(&[1, 3]) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn shannon_properties() {
        assert_eq!(shannon_entropy(&[]), 0.0);
        assert_eq!(shannon_entropy(&[7]), 0.0);
        let two = shannon_entropy(&[4, 4]);
        let four = shannon_entropy(&[4, 4, 4, 4]);
        assert!((two - 1.0).abs() < 1e-12);
        assert!((four - 2.0).abs() < 1e-12);
        assert!(four > two);
    }

    #[test]
    fn shannon_over_flattened_specialisations() {
        let same = vec![with_specs(&["Fiscal"]), with_specs(&["Fiscal", "Fiscal"])];
        let s = compute_statistics(&same);
        assert_eq!(s.shannon_specialisations, 0.0);
        assert!(s.shannon_specialisations.is_sign_positive());

        let mixed = vec![with_specs(&["Fiscal", "Social"]), with_specs(&["Pénal"]), with_specs(&[])];
        let s = compute_statistics(&mixed);
        assert_eq!(s.shannon_specialisations, 1.58);
        assert_eq!(s.multispecialistes, 1);
        assert_eq!(s.pct_no_specialisation, 33.3);
        assert_eq!(s.diversite_specialisation, 33.3);
    }

    #[test]
    fn bar_association_metrics() {
        let mut data = Vec::new();
        for (bar, n) in [("Paris", 5), ("Lyon", 2), ("Lille", 1), ("Nice", 1), ("Pau", 1)] {
            for _ in 0..n {
                data.push(LawyerRecord {
                    barreau: Some(bar.to_string()),
                    ..record()
                });
            }
        }
        data.push(record());
        let s = compute_statistics(&data);
        assert_eq!(s.total, 11);
        assert_eq!(s.unique_barreaux, 5);
        assert_eq!(s.pct_top3_barreaux, 72.7);
        // counts [5, 2, 1, 1, 1]: sum|xi-xj| = 36, mean 2 -> 36 / (2 * 25 * 2)
        assert_eq!(s.gini_barreaux, 0.36);
    }

    #[test]
    fn languages_metrics() {
        let data = vec![
            LawyerRecord {
                langues: vec!["Anglais".into()],
                ..record()
            },
            record(),
            record(),
            record(),
        ];
        let s = compute_statistics(&data);
        assert_eq!(s.multilingues, 1);
        assert_eq!(s.diversite_linguistique, 25.0);
        assert_eq!(s.pct_monolingues, 75.0);
    }

    #[test]
    fn percentages_stay_in_range() {
        let mut data = Vec::new();
        for i in 0..37u32 {
            data.push(LawyerRecord {
                annees_experience: i * 3 % 50,
                ville: Some(format!("C{}", i % 4)),
                barreau: Some(format!("B{}", i % 6)),
                langues: (0..(i % 3)).map(|k| format!("L{k}")).collect(),
                specialisations: (0..(i % 4).min(3)).map(|k| format!("S{k}")).collect(),
                ..record()
            });
        }
        let s = compute_statistics(&data);
        for p in percentages(&s) {
            assert!((0.0..=100.0).contains(&p), "{p} out of range");
        }
        assert!(s.gini_barreaux < 1.0);
    }

    #[test]
    fn age_cross_tabs() {
        let mk = |bracket, in_structure, is_specialised| LawyerRecord {
            age_bracket: Some(bracket),
            in_structure,
            is_specialised,
            ..record()
        };
        let data = vec![
            mk(AgeBracket::Fifties, true, false),
            mk(AgeBracket::Thirties, true, true),
            mk(AgeBracket::Thirties, false, true),
            mk(AgeBracket::Thirties, true, false),
            record(),
        ];
        let insights = compute_age_insights(&data);
        assert_eq!(insights.structure.len(), 2);
        let thirties = &insights.structure[0];
        assert_eq!(thirties.age_bracket, AgeBracket::Thirties);
        assert_eq!((thirties.solo, thirties.structure), (1, 2));
        assert_eq!(thirties.pct_structure, 66.7);
        let fifties = &insights.structure[1];
        assert_eq!(fifties.pct_structure, 100.0);

        let spe = &insights.specialisation[0];
        assert_eq!((spe.non_specialises, spe.specialises), (1, 2));
        assert_eq!(spe.pct_specialises, 66.7);
        assert_eq!(insights.specialisation[1].pct_specialises, 0.0);
    }
}
