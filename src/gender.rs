//! First-name based gender inference.
//!
//! The detector is an ordinary value: build it once (usually in `main`) and
//! hand a reference to the normalizer.

use crate::error::{Result, StatsError};
use crate::types::Gender;
use log::debug;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Raw answer of a name lookup, before collapsing to [`Gender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameGender {
    Male,
    Female,
    MostlyMale,
    MostlyFemale,
    /// Androgynous: used for both genders.
    Andy,
    Unknown,
}

impl NameGender {
    pub fn parse(code: &str) -> Option<NameGender> {
        match code.trim().to_lowercase().as_str() {
            "male" | "m" => Some(NameGender::Male),
            "female" | "f" => Some(NameGender::Female),
            "mostly_male" | "?m" | "1m" => Some(NameGender::MostlyMale),
            "mostly_female" | "?f" | "1f" => Some(NameGender::MostlyFemale),
            "andy" | "?" => Some(NameGender::Andy),
            "unknown" => Some(NameGender::Unknown),
            _ => None,
        }
    }

    /// `andy` and `unknown` tell us nothing; the fallback chain moves on.
    pub fn is_inconclusive(self) -> bool {
        matches!(self, NameGender::Andy | NameGender::Unknown)
    }

    pub fn collapse(self) -> Gender {
        match self {
            NameGender::Male | NameGender::MostlyMale => Gender::Male,
            NameGender::Female | NameGender::MostlyFemale => Gender::Female,
            NameGender::Andy | NameGender::Unknown => Gender::Unknown,
        }
    }
}

pub trait GenderDetector {
    fn get_gender(&self, name: &str) -> NameGender;

    /// Identifies the detector's answers, so cached results computed with
    /// one detector are not served for another.
    fn fingerprint(&self) -> String {
        String::new()
    }
}

// Common first names seen in French bar registries.
const BUNDLED_NAMES: &str = "\
Jean,male
Pierre,male
Michel,male
Philippe,male
Alain,male
Nicolas,male
François,male
Christophe,male
Patrick,male
Daniel,male
Thomas,male
Julien,male
Laurent,male
Olivier,male
Éric,male
Eric,male
Frédéric,male
Frederic,male
Stéphane,male
Stephane,male
Sébastien,male
Sebastien,male
David,male
Antoine,male
Alexandre,male
Guillaume,male
Vincent,male
Bernard,male
Jacques,male
Christian,male
Thierry,male
Marc,male
Pascal,male
Bruno,male
Hugo,male
Louis,male
Paul,male
Arnaud,male
Mathieu,male
Maxime,male
Benoît,male
Benoit,male
Jérôme,male
Jerome,male
Xavier,male
Yves,male
Hervé,male
Herve,male
Gérard,male
Gerard,male
Rémi,male
Remi,male
Mohamed,male
Karim,male
Marie,female
Nathalie,female
Isabelle,female
Sylvie,female
Catherine,female
Françoise,female
Francoise,female
Valérie,female
Valerie,female
Christine,female
Sophie,female
Anne,female
Julie,female
Sandrine,female
Céline,female
Celine,female
Caroline,female
Camille,andy
Claire,female
Laure,female
Aurélie,female
Aurelie,female
Émilie,female
Emilie,female
Hélène,female
Helene,female
Stéphanie,female
Stephanie,female
Virginie,female
Juliette,female
Charlotte,female
Pauline,female
Mathilde,female
Élodie,female
Elodie,female
Agnès,female
Agnes,female
Martine,female
Véronique,female
Veronique,female
Léa,female
Lea,female
Inès,female
Ines,female
Fatima,female
Sarah,female
Laura,female
Audrey,female
Alice,female
Clémence,female
Clemence,female
Margaux,female
Adrien,male
Alexis,male
Anthony,male
Arthur,male
Aurélien,male
Aurelien,male
Baptiste,male
Bastien,male
Benjamin,male
Bertrand,male
Cédric,male
Cedric,male
Charles,male
Clément,male
Clement,male
Corentin,male
Cyril,male
Damien,male
Denis,male
Didier,male
Dimitri,male
Édouard,male
Edouard,male
Emmanuel,male
Étienne,male
Etienne,male
Fabien,male
Fabrice,male
Florian,male
Franck,male
Gabriel,male
Gaël,male
Gael,male
Gaëtan,male
Gaetan,male
Geoffroy,male
Georges,male
Gilles,male
Grégoire,male
Gregoire,male
Grégory,male
Gregory,male
Guy,male
Henri,male
Jacky,male
Jean-Baptiste,male
Jean-Claude,male
Jean-François,male
Jean-Francois,male
Jean-Luc,male
Jean-Marc,male
Jean-Michel,male
Jean-Paul,male
Jean-Pierre,male
Jérémie,male
Jeremie,male
Jérémy,male
Jeremy,male
Joël,male
Joel,male
Jonathan,male
Jordan,male
Joseph,male
Kévin,male
Kevin,male
Lionel,male
Loïc,male
Loic,male
Lucas,male
Luc,male
Ludovic,male
Marcel,male
Martin,male
Matthieu,male
Maurice,male
Mickaël,male
Mickael,male
Nathan,male
Noël,male
Noel,male
Pierre-Yves,male
Quentin,male
Raphaël,male
Raphael,male
Raymond,male
René,male
Rene,male
Renaud,male
Richard,male
Robert,male
Roger,male
Romain,male
Samuel,male
Serge,male
Simon,male
Sylvain,male
Théo,male
Theo,male
Théophile,male
Theophile,male
Timothée,male
Timothee,male
Tristan,male
Valentin,male
Victor,male
Yann,male
Yannick,male
Ahmed,male
Ali,male
Amine,male
Hassan,male
Khalid,male
Mehdi,male
Mourad,male
Nabil,male
Omar,male
Rachid,male
Samir,male
Sofiane,male
Youssef,male
Yacine,male
Bilal,male
Driss,male
Farid,male
Hamid,male
Malik,male
Walid,male
Adèle,female
Adele,female
Agathe,female
Amandine,female
Amélie,female
Amelie,female
Anaïs,female
Anais,female
Angélique,female
Angelique,female
Annie,female
Béatrice,female
Beatrice,female
Bénédicte,female
Benedicte,female
Brigitte,female
Capucine,female
Carole,female
Cécile,female
Cecile,female
Chantal,female
Christelle,female
Clara,female
Clémentine,female
Clementine,female
Colette,female
Corinne,female
Delphine,female
Denise,female
Diane,female
Élise,female
Elise,female
Élisabeth,female
Elisabeth,female
Elsa,female
Emma,female
Estelle,female
Eva,female
Fabienne,female
Florence,female
Gaëlle,female
Gaelle,female
Geneviève,female
Genevieve,female
Hortense,female
Ingrid,female
Irène,female
Irene,female
Jacqueline,female
Jeanne,female
Joëlle,female
Joelle,female
Josiane,female
Karine,female
Laëtitia,female
Laetitia,female
Lucie,female
Lydie,female
Madeleine,female
Manon,female
Marianne,female
Marine,female
Marion,female
Marjorie,female
Marthe,female
Mélanie,female
Melanie,female
Monique,female
Muriel,female
Myriam,female
Nadia,female
Nadine,female
Noémie,female
Noemie,female
Océane,female
Oceane,female
Odile,female
Pascale,female
Patricia,female
Perrine,female
Rachel,female
Raphaëlle,female
Raphaelle,female
Sabine,female
Salomé,female
Salome,female
Séverine,female
Severine,female
Solène,female
Solene,female
Solenne,female
Suzanne,female
Sylvianne,female
Tiphaine,female
Vanessa,female
Victoire,female
Yasmine,female
Zoé,female
Zoe,female
Aïcha,female
Aicha,female
Amel,female
Amina,female
Farah,female
Fatiha,female
Fatou,female
Karima,female
Leïla,female
Leila,female
Malika,female
Meriem,female
Nawel,female
Samira,female
Sonia,female
Soraya,female
Anne-Sophie,female
Marie-Christine,female
Marie-Laure,female
Marie-Pierre,female
Anne-Laure,female
Anne-Marie,female
Dominique,andy
Claude,andy
Andy,andy
Maxence,mostly_male
Sacha,mostly_male
Alix,mostly_female
Morgane,mostly_female
";

static BUNDLED: Lazy<Vec<(String, NameGender)>> = Lazy::new(|| {
    BUNDLED_NAMES
        .lines()
        .filter_map(parse_line)
        .collect()
});

fn parse_line(line: &str) -> Option<(String, NameGender)> {
    let (name, code) = line.split_once(',')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), NameGender::parse(code)?))
}

/// One gender reading of a name, scored like the `nam_dict.txt` lookups:
/// number of countries where the reading occurs, then summed frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reading {
    gender: NameGender,
    countries: usize,
    weight: i64,
}

/// Dictionary-backed detector.
///
/// A name may carry several readings (e.g. male in one country, female in
/// another); lookups return the most widespread one.
#[derive(Debug, Clone, Default)]
pub struct NameDictionary {
    names: HashMap<String, Vec<Reading>>,
    case_sensitive: bool,
}

impl NameDictionary {
    pub fn new(case_sensitive: bool) -> Self {
        NameDictionary {
            names: HashMap::new(),
            case_sensitive,
        }
    }

    /// Detector preloaded with the bundled first-name list.
    pub fn bundled(case_sensitive: bool) -> Self {
        let mut dict = NameDictionary::new(case_sensitive);
        for (name, gender) in BUNDLED.iter() {
            dict.insert(name, *gender);
        }
        dict
    }

    /// Set `name` to a single reading, replacing whatever was there.
    pub fn insert(&mut self, name: &str, gender: NameGender) {
        let key = self.key(name);
        let reading = Reading {
            gender,
            countries: 1,
            weight: 0,
        };
        self.names.insert(key, vec![reading]);
    }

    fn add_reading(&mut self, name: &str, reading: Reading) {
        let key = self.key(name);
        let readings = self.names.entry(key).or_default();
        match readings.iter_mut().find(|r| r.gender == reading.gender) {
            Some(existing) => *existing = reading,
            None => readings.push(reading),
        }
    }

    /// Merge a `name,gender` CSV into the dictionary. Later entries win.
    /// Rows with an unrecognized gender code are skipped.
    pub fn extend_from_csv(&mut self, path: &Path) -> Result<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut added = 0usize;
        for record in rdr.records() {
            let record = record?;
            let (Some(name), Some(code)) = (record.get(0), record.get(1)) else {
                continue;
            };
            let name = name.trim();
            match NameGender::parse(code) {
                Some(gender) if !name.is_empty() => {
                    self.insert(name, gender);
                    added += 1;
                }
                _ => debug!("skipping name dictionary row {:?}", record),
            }
        }
        Ok(added)
    }

    /// Merge a `nam_dict.txt` first-name database (the file shipped with the
    /// usual gender-guesser packages) into the dictionary.
    pub fn extend_from_nam_dict(&mut self, path: &Path) -> Result<usize> {
        let bytes = fs::read(path).map_err(|e| StatsError::io(path.display().to_string(), e))?;
        Ok(self.extend_from_nam_dict_text(&decode_latin1_or_utf8(bytes)))
    }

    /// Parse `nam_dict.txt` content. Lines starting with `#` or `=` are
    /// comments and equivalence rules. Data lines hold a gender code, the
    /// name (`+` joins compound names), and from column 30 one frequency
    /// digit per country.
    pub fn extend_from_nam_dict_text(&mut self, text: &str) -> usize {
        let mut added = 0usize;
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') || line.starts_with('=') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(code), Some(name)) = (parts.next(), parts.next()) else {
                continue;
            };
            let gender = match code {
                "M" => NameGender::Male,
                "1M" | "?M" => NameGender::MostlyMale,
                "F" => NameGender::Female,
                "1F" | "?F" => NameGender::MostlyFemale,
                "?" => NameGender::Andy,
                _ => {
                    debug!("skipping nam_dict line with code {:?}", code);
                    continue;
                }
            };
            let frequencies: Vec<char> = line.chars().skip(30).filter(|c| *c != ' ').collect();
            let reading = Reading {
                gender,
                countries: frequencies.len(),
                weight: frequencies.iter().map(|c| frequency_value(*c)).sum(),
            };
            if name.contains('+') {
                for joiner in ["", " ", "-"] {
                    self.add_reading(&name.replace('+', joiner), reading);
                }
            } else {
                self.add_reading(name, reading);
            }
            added += 1;
        }
        added
    }

    /// Number of distinct names known.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}

fn frequency_value(c: char) -> i64 {
    let code = c as i64;
    if code > 64 {
        code - 55
    } else {
        code - 48
    }
}

fn decode_latin1_or_utf8(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

impl GenderDetector for NameDictionary {
    fn get_gender(&self, name: &str) -> NameGender {
        let Some(readings) = self.names.get(&self.key(name)) else {
            return NameGender::Unknown;
        };
        let mut best: Option<&Reading> = None;
        for reading in readings {
            let better = match best {
                None => reading.countries > 0,
                Some(b) => {
                    reading.countries > b.countries
                        || (reading.countries == b.countries && reading.weight > b.weight)
                }
            };
            if better {
                best = Some(reading);
            }
        }
        best.map(|r| r.gender).unwrap_or(NameGender::Unknown)
    }

    fn fingerprint(&self) -> String {
        let mut keys: Vec<&String> = self.names.keys().collect();
        keys.sort();
        let mut hasher = Sha256::new();
        hasher.update(if self.case_sensitive { b"cs" } else { b"ci" });
        for key in keys {
            hasher.update(key.as_bytes());
            for r in &self.names[key] {
                hasher.update(format!("\t{:?}:{}:{}", r.gender, r.countries, r.weight).as_bytes());
            }
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

/// Strip diacritics: decompose, then drop combining marks.
pub fn transliterate(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Resolve a first name through the fallback chain: as written,
/// transliterated, cut at the first hyphen, then both.
pub fn genderize<D: GenderDetector + ?Sized>(detector: &D, name: &str) -> Gender {
    let truncated = name.split('-').next().unwrap_or(name);
    let attempts = [
        name.to_string(),
        transliterate(name),
        truncated.to_string(),
        transliterate(truncated),
    ];
    attempts
        .iter()
        .map(|candidate| detector.get_gender(candidate))
        .find(|g| !g.is_inconclusive())
        .map(NameGender::collapse)
        .unwrap_or(Gender::Unknown)
}

/// Gender of a full name, looked up on its first whitespace-separated token.
pub fn gender_of_full_name<D: GenderDetector + ?Sized>(detector: &D, full_name: &str) -> Gender {
    match full_name.split_whitespace().next() {
        Some(first) => genderize(detector, first),
        None => Gender::Unknown,
    }
}
