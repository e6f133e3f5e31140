use crate::config::Settings;
use crate::error::{Result, StatsError};
use crate::gender::GenderDetector;
use crate::normalize::process_data;
use crate::types::{Gender, LawyerRecord, RawRow, RawValue};
use calamine::{open_workbook_auto, DataType, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

pub const COL_NOM: &str = "nom_complet";
pub const COL_BARREAU: &str = "barreau";
pub const COL_VILLE: &str = "ville";
pub const COL_CODE_POSTAL: &str = "code_postal";
pub const COL_STRUCTURE: &str = "structure_reference";
pub const COL_SERMENT: &str = "date_prestation_serment";
pub const COL_LANGUES: &str = "langues";
pub const COLS_SPECIALISATIONS: [&str; 3] =
    ["specialisations_1", "specialisations_2", "specialisations_3"];
pub const COLS_ACTIVITES: [&str; 3] = [
    "activite_dominante_1",
    "activite_dominante_2",
    "activite_dominante_3",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub unparsed_dates: usize,
    pub unknown_genders: usize,
}

impl LoadReport {
    pub fn from_records(records: &[LawyerRecord]) -> Self {
        LoadReport {
            total_rows: records.len(),
            unparsed_dates: records
                .iter()
                .filter(|r| r.date_prestation_serment.is_none())
                .count(),
            unknown_genders: records
                .iter()
                .filter(|r| r.gender == Gender::Unknown)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Workbook,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<FileKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileKind::Workbook),
            _ => Err(StatsError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Column positions of every field a [`RawRow`] needs.
struct ColumnMap {
    nom: usize,
    barreau: usize,
    ville: usize,
    code_postal: usize,
    structure: usize,
    serment: usize,
    langues: usize,
    specialisations: [usize; 3],
    activites: [usize; 3],
}

impl ColumnMap {
    fn from_headers<'a, I>(headers: I) -> Result<ColumnMap>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let index: HashMap<String, usize> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        let col = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
        };
        Ok(ColumnMap {
            nom: col(COL_NOM)?,
            barreau: col(COL_BARREAU)?,
            ville: col(COL_VILLE)?,
            code_postal: col(COL_CODE_POSTAL)?,
            structure: col(COL_STRUCTURE)?,
            serment: col(COL_SERMENT)?,
            langues: col(COL_LANGUES)?,
            specialisations: [
                col(COLS_SPECIALISATIONS[0])?,
                col(COLS_SPECIALISATIONS[1])?,
                col(COLS_SPECIALISATIONS[2])?,
            ],
            activites: [
                col(COLS_ACTIVITES[0])?,
                col(COLS_ACTIVITES[1])?,
                col(COLS_ACTIVITES[2])?,
            ],
        })
    }

    fn build_row(&self, cell: impl Fn(usize) -> RawValue) -> RawRow {
        RawRow {
            nom_complet: cell(self.nom),
            barreau: cell(self.barreau),
            ville: cell(self.ville),
            code_postal: cell(self.code_postal),
            structure_reference: cell(self.structure),
            date_prestation_serment: cell(self.serment),
            langues: cell(self.langues),
            specialisations: self.specialisations.map(&cell),
            activites_dominantes: self.activites.map(&cell),
        }
    }
}

/// Empty CSV fields are missing values; anything else, whitespace included,
/// is kept as text.
fn csv_cell(s: Option<&str>) -> RawValue {
    match s {
        None | Some("") => RawValue::Empty,
        Some(s) => RawValue::Text(s.to_string()),
    }
}

pub fn read_csv_rows<R: std::io::Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::from_headers(rdr.headers()?.iter())?;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(columns.build_row(|i| csv_cell(record.get(i))));
    }
    Ok(rows)
}

/// Excel stores dates as days since 1899-12-30 (the 1900 leap-year bug
/// included).
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn workbook_cell(v: Option<&DataType>) -> RawValue {
    match v {
        None | Some(DataType::Empty) => RawValue::Empty,
        Some(DataType::String(s)) if s.is_empty() => RawValue::Empty,
        Some(DataType::String(s)) => RawValue::Text(s.clone()),
        Some(DataType::Int(i)) => RawValue::Number(*i as f64),
        Some(DataType::Float(f)) => RawValue::Number(*f),
        Some(DataType::Bool(b)) => RawValue::Bool(*b),
        Some(DataType::DateTime(serial)) => excel_serial_to_datetime(*serial)
            .map(RawValue::DateTime)
            .unwrap_or(RawValue::Empty),
        Some(_) => RawValue::Empty,
    }
}

pub fn rows_from_range(range: &Range<DataType>) -> Result<Vec<RawRow>> {
    let mut iter = range.rows();
    let header = iter
        .next()
        .ok_or_else(|| StatsError::MissingSheet("<header row>".to_string()))?;
    let header_text: Vec<String> = header
        .iter()
        .map(|c| match c {
            DataType::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    let columns = ColumnMap::from_headers(header_text.iter().map(String::as_str))?;
    Ok(iter
        .map(|row| columns.build_row(|i| workbook_cell(row.get(i))))
        .collect())
}

pub fn read_workbook_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<RawRow>> {
    let path_str = path.display().to_string();
    let mut workbook = open_workbook_auto(path).map_err(|source| StatsError::Workbook {
        path: path_str.clone(),
        source,
    })?;
    let range = match sheet {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    };
    let sheet_label = sheet.unwrap_or("<first sheet>").to_string();
    let range = range
        .ok_or_else(|| StatsError::MissingSheet(sheet_label.clone()))?
        .map_err(|source| StatsError::Workbook {
            path: path_str,
            source,
        })?;
    debug!("worksheet {} has {:?} cells", sheet_label, range.get_size());
    rows_from_range(&range)
}

/// Read the raw rows of a CSV or workbook file.
pub fn read_raw(path: &Path, sheet: Option<&str>) -> Result<Vec<RawRow>> {
    let rows = match FileKind::from_path(path)? {
        FileKind::Csv => {
            let file = std::fs::File::open(path)
                .map_err(|e| StatsError::io(path.display().to_string(), e))?;
            read_csv_rows(file)?
        }
        FileKind::Workbook => read_workbook_rows(path, sheet)?,
    };
    info!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Load a registry file and normalize every row.
pub fn load_and_clean<D: GenderDetector + ?Sized>(
    path: &Path,
    sheet: Option<&str>,
    detector: &D,
    settings: &Settings,
) -> Result<(Vec<LawyerRecord>, LoadReport)> {
    let raw = read_raw(path, sheet)?;
    let records = process_data(&raw, detector, settings);
    let report = LoadReport::from_records(&records);
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "nom_complet,barreau,ville,code_postal,structure_reference,date_prestation_serment,langues,specialisations_1,specialisations_2,specialisations_3,activite_dominante_1,activite_dominante_2,activite_dominante_3";

    #[test]
    fn reads_csv_rows_by_header_name() {
        let data = format!(
            "{HEADER}\nJean DUPONT,Paris,Paris,75008,,2001-02-03,\"['Anglais', 'Français']\",Droit fiscal,  ,,Conseil,,\n"
        );
        let rows = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.nom_complet, RawValue::from("Jean DUPONT"));
        assert_eq!(row.structure_reference, RawValue::Empty);
        assert_eq!(row.langues, RawValue::from("['Anglais', 'Français']"));
        assert_eq!(row.specialisations[1], RawValue::from("  "));
        assert_eq!(row.specialisations[2], RawValue::Empty);
        assert_eq!(row.activites_dominantes[0], RawValue::from("Conseil"));
    }

    #[test]
    fn column_order_does_not_matter() {
        let cols: Vec<&str> = HEADER.split(',').rev().collect();
        let mut line: Vec<&str> = vec![""; cols.len()];
        line[cols.len() - 1] = "Marie CURIE";
        let data = format!("{}\n{}\n", cols.join(","), line.join(","));
        let rows = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0].nom_complet, RawValue::from("Marie CURIE"));
    }

    #[test]
    fn missing_column_is_reported() {
        let data = "nom_complet,barreau\nA,B\n";
        match read_csv_rows(data.as_bytes()) {
            Err(StatsError::MissingColumn(c)) => assert_eq!(c, "ville"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn short_rows_are_padded_with_missing_values() {
        let data = format!("{HEADER}\nJean DUPONT,Paris\n");
        let rows = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows[0].barreau, RawValue::from("Paris"));
        assert_eq!(rows[0].ville, RawValue::Empty);
    }

    #[test]
    fn file_kind_by_extension() {
        assert_eq!(FileKind::from_path(Path::new("a.CSV")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("a.xlsx")).unwrap(), FileKind::Workbook);
        assert_eq!(FileKind::from_path(Path::new("a.xls")).unwrap(), FileKind::Workbook);
        assert!(matches!(
            FileKind::from_path(Path::new("a.txt")),
            Err(StatsError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn excel_serial_dates() {
        let dt = excel_serial_to_datetime(36526.0).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let dt = excel_serial_to_datetime(36526.5).unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "12:00");
        assert!(excel_serial_to_datetime(-1.0).is_none());
    }

    #[test]
    fn workbook_cells_map_to_raw_values() {
        assert_eq!(workbook_cell(None), RawValue::Empty);
        assert_eq!(workbook_cell(Some(&DataType::String(String::new()))), RawValue::Empty);
        assert_eq!(workbook_cell(Some(&DataType::Int(75008))), RawValue::Number(75008.0));
        assert_eq!(workbook_cell(Some(&DataType::Bool(true))), RawValue::Bool(true));
        assert!(matches!(
            workbook_cell(Some(&DataType::DateTime(36526.0))),
            RawValue::DateTime(_)
        ));
    }

    #[test]
    fn rows_from_in_memory_range() {
        let headers: Vec<&str> = HEADER.split(',').collect();
        let mut range: Range<DataType> = Range::new((0, 0), (1, headers.len() as u32 - 1));
        for (i, h) in headers.iter().enumerate() {
            range.set_value((0, i as u32), DataType::String(h.to_string()));
        }
        range.set_value((1, 0), DataType::String("Claire MARTIN".into()));
        range.set_value((1, 3), DataType::Float(69002.0));
        range.set_value((1, 5), DataType::DateTime(36526.0));
        let rows = rows_from_range(&range).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code_postal, RawValue::Number(69002.0));
        assert!(matches!(rows[0].date_prestation_serment, RawValue::DateTime(_)));
        assert_eq!(rows[0].barreau, RawValue::Empty);
    }
}
