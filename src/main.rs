// Entry point and high-level CLI flow.
//
// - One-shot mode loads the file, prints KPIs, cross-tabs and chart tables,
//   and optionally exports them.
// - `--interactive` offers a numbered menu: load the file, pick a bar
//   association, generate reports. The normalized table is cached by content
//   so repeated reports do not re-read or re-normalize anything.
mod args;

use args::Args;
use barreau_stats::cache::{CachedTable, PipelineCache};
use barreau_stats::charts::{barreau_choices, insights, top_cities, top_postal_codes};
use barreau_stats::output::{chart_tables, export_all, preview_table, Export};
use barreau_stats::util::format_int;
use barreau_stats::{
    compute_age_insights, compute_statistics, filter_by_barreau, NameDictionary, Result, Settings,
    ALL_BARREAUX,
};
use clap::Parser;
use log::{error, info, warn};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

/// Everything that lives for the length of one run. Owned, not global.
struct Session {
    args: Args,
    settings: Settings,
    detector: NameDictionary,
    cache: PipelineCache,
    table: Option<CachedTable>,
    selection: String,
}

impl Session {
    fn new(args: Args) -> Result<Session> {
        let mut settings = match &args.config {
            Some(path) => Settings::from_json_file(path)?,
            None => Settings::default(),
        };
        if let Some(date) = args.reference_date {
            settings.reference_date = Some(date);
        }
        // Pin "today" once so every action in the session agrees.
        settings.reference_date = Some(settings.today());
        settings.validate()?;

        let mut detector = NameDictionary::bundled(settings.case_sensitive_names);
        if let Some(path) = &args.name_dict {
            let added = detector.extend_from_nam_dict(path)?;
            info!("loaded {} nam_dict entries from {}", added, path.display());
        }
        if let Some(path) = &args.names {
            let added = detector.extend_from_csv(path)?;
            info!("loaded {} names from {}", added, path.display());
        }
        info!("name dictionary holds {} first names", detector.len());

        let selection = args
            .barreau
            .clone()
            .unwrap_or_else(|| ALL_BARREAUX.to_string());
        Ok(Session {
            args,
            settings,
            detector,
            cache: PipelineCache::new(),
            table: None,
            selection,
        })
    }
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Load (or reuse) the normalized table and print a short summary.
///
/// A failed load drops whatever was loaded before.
fn handle_load(session: &mut Session, path: &Path) -> Result<()> {
    let loaded = session.cache.load(
        path,
        session.args.sheet.as_deref(),
        &session.detector,
        &session.settings,
    );
    let table = match loaded {
        Ok(t) => t,
        Err(e) => {
            session.table = None;
            session.cache.clear();
            return Err(e);
        }
    };
    let report = &table.report;
    println!(
        "Traitement du fichier... ({} lignes chargées)",
        format_int(report.total_rows)
    );
    if report.unparsed_dates > 0 {
        println!(
            "Note : {} lignes sans date de prestation de serment exploitable.",
            format_int(report.unparsed_dates)
        );
    }
    if report.unknown_genders > 0 {
        println!(
            "Info : genre indéterminé pour {} lignes.",
            format_int(report.unknown_genders)
        );
    }
    println!();
    session.table = Some(table);
    Ok(())
}

/// Let the user pick a bar association among the ones present in the table.
fn handle_select_barreau(session: &mut Session) {
    let Some(table) = &session.table else {
        println!("Erreur : aucune donnée chargée. Chargez d'abord le fichier (option 1).\n");
        return;
    };
    let choices = barreau_choices(&table.records);
    for (i, choice) in choices.iter().enumerate() {
        println!("[{}] {}", i, choice);
    }
    let picked = read_line("Barreau : ");
    match picked.parse::<usize>().ok().and_then(|i| choices.get(i)) {
        Some(choice) => {
            session.selection = choice.clone();
            println!("Filtre : {}\n", session.selection);
        }
        None => println!("Choix invalide, filtre inchangé ({}).\n", session.selection),
    }
}

/// Print KPIs, cross-tabs and chart tables for the current selection, and
/// export them when an output directory was given.
fn handle_generate_reports(session: &mut Session) -> Result<()> {
    let Some(table) = session.table.clone() else {
        println!("Erreur : aucune donnée chargée. Chargez d'abord le fichier (option 1).\n");
        return Ok(());
    };
    let rows = session.args.preview_rows;
    let subset = filter_by_barreau(&table.records, &session.selection);
    if subset.is_empty() && session.selection != ALL_BARREAUX {
        warn!("no rows for bar association {:?}", session.selection);
    }

    let stats = compute_statistics(&subset);
    let age = compute_age_insights(&subset);
    let charts = session
        .cache
        .charts(&table, &session.selection, &session.settings);
    let villes = top_cities(&subset, 5);
    let codes = top_postal_codes(&subset, 10);
    let lines = insights(&stats);

    println!("Annuaire des Avocats, barreau : {}\n", session.selection);
    preview_table("Indicateurs", None, &stats.entries(), usize::MAX);
    preview_table(
        "Structure par tranche d'âge",
        Some("âge estimé = ancienneté + âge moyen au serment"),
        &age.structure,
        rows,
    );
    preview_table("Spécialisation par tranche d'âge", None, &age.specialisation, rows);
    for (_, title, table_rows) in chart_tables(&charts) {
        preview_table(title, None, table_rows, rows);
    }
    preview_table("Top villes", None, &villes, 5);
    preview_table("Top codes postaux", None, &codes, 10);

    println!("Insights & Tendances");
    for line in &lines {
        println!("- {}", line);
    }
    println!();

    if let Some(dir) = &session.args.out_dir {
        let export = Export {
            barreau: &session.selection,
            statistiques: &stats,
            age_insights: &age,
            top_villes: &villes,
            top_codes_postaux: &codes,
            insights: &lines,
        };
        let written = export_all(dir, &export, &charts)?;
        println!("Exporté : {} fichiers dans {}\n", written.len(), dir.display());
    }
    Ok(())
}

fn run_interactive(session: &mut Session) {
    loop {
        println!("Annuaire des Avocats");
        println!("[1] Charger le fichier");
        println!("[2] Filtrer par barreau ({})", session.selection);
        println!("[3] Générer les rapports");
        println!("[4] Quitter\n");
        match read_line("Choix : ").as_str() {
            "1" => {
                let path = match &session.args.input {
                    Some(p) => p.clone(),
                    None => read_line("Fichier : ").into(),
                };
                if let Err(e) = handle_load(session, &path) {
                    eprintln!("Erreur lecture fichier : {}\n", e);
                }
            }
            "2" => handle_select_barreau(session),
            "3" => {
                if let Err(e) = handle_generate_reports(session) {
                    eprintln!("Erreur : {}\n", e);
                }
            }
            "4" => {
                println!("Fin du programme.");
                break;
            }
            _ => println!("Choix invalide. Entrez 1, 2, 3 ou 4.\n"),
        }
    }
}

fn run(args: Args) -> Result<()> {
    let interactive = args.interactive;
    let input = args.input.clone();
    let mut session = Session::new(args)?;
    if interactive {
        run_interactive(&mut session);
        return Ok(());
    }
    let Some(path) = input else {
        return Err(barreau_stats::StatsError::Config(
            "an input file is required (use --input or --interactive)".to_string(),
        ));
    };
    handle_load(&mut session, &path)?;
    handle_generate_reports(&mut session)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Erreur : {}", e);
            ExitCode::FAILURE
        }
    }
}
