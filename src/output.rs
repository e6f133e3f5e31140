use crate::error::{Result, StatsError};
use crate::types::{AgeInsights, ChartData, NameCount, Statistics};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()
        .map_err(|e| StatsError::io(path.display().to_string(), e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s).map_err(|e| StatsError::io(path.display().to_string(), e))?;
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(aucune ligne)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
    if rows.len() > max_rows {
        println!("... {} lignes de plus\n", rows.len() - max_rows);
    }
}

/// Chart tables in display order, with the file stem each one is exported as.
pub fn chart_tables(charts: &ChartData) -> Vec<(&'static str, &'static str, &[NameCount])> {
    vec![
        ("barreau", "Top barreaux", charts.barreau.as_slice()),
        ("langues", "Langues étrangères", charts.langues.as_slice()),
        ("specialisations", "Spécialisations", charts.specialisations.as_slice()),
        ("activites_dominantes", "Activités dominantes", charts.activites_dominantes.as_slice()),
        ("experience", "Expérience", charts.experience.as_slice()),
        ("gender", "Genre", charts.gender.as_slice()),
        ("flux_entree", "Flux d'entrée au barreau", charts.flux_entree.as_slice()),
    ]
}

/// Everything the report writes into an export directory.
#[derive(Debug, Serialize)]
pub struct Export<'a> {
    pub barreau: &'a str,
    pub statistiques: &'a Statistics,
    pub age_insights: &'a AgeInsights,
    pub top_villes: &'a [NameCount],
    pub top_codes_postaux: &'a [NameCount],
    pub insights: &'a [String],
}

/// Write `statistiques.json`, `charts.json` and one CSV per table into `dir`.
/// Returns the written paths.
pub fn export_all(dir: &Path, export: &Export<'_>, charts: &ChartData) -> Result<Vec<String>> {
    fs::create_dir_all(dir).map_err(|e| StatsError::io(dir.display().to_string(), e))?;
    let mut written = Vec::new();
    let mut record = |p: &Path| written.push(p.display().to_string());

    let stats_path = dir.join("statistiques.json");
    write_json(&stats_path, export)?;
    record(&stats_path);

    let charts_path = dir.join("charts.json");
    write_json(&charts_path, charts)?;
    record(&charts_path);

    for (stem, _, rows) in chart_tables(charts) {
        let p = dir.join(format!("{stem}.csv"));
        write_csv(&p, rows)?;
        record(&p);
    }

    let p = dir.join("age_structure.csv");
    write_csv(&p, &export.age_insights.structure)?;
    record(&p);
    let p = dir.join("age_specialisation.csv");
    write_csv(&p, &export.age_insights.specialisation)?;
    record(&p);
    let p = dir.join("top_villes.csv");
    write_csv(&p, export.top_villes)?;
    record(&p);
    let p = dir.join("top_codes_postaux.csv");
    write_csv(&p, export.top_codes_postaux)?;
    record(&p);

    Ok(written)
}
