//! Lawyer registry analytics.
//!
//! Raw spreadsheet rows go through the [`normalize`] step once, then feed the
//! [`stats`] aggregator and the [`charts`] preparer. Every step is a pure
//! function of its input; the only state is the caller-owned
//! [`cache::PipelineCache`].

pub mod cache;
pub mod charts;
pub mod config;
pub mod error;
pub mod gender;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod stats;
pub mod types;
pub mod util;

pub use charts::{dashboard, filter_by_barreau, prepare_chart_data, ALL_BARREAUX};
pub use config::Settings;
pub use error::{Result, StatsError};
pub use gender::{GenderDetector, NameDictionary, NameGender};
pub use normalize::process_data;
pub use stats::{compute_age_insights, compute_statistics};
pub use types::{AgeBracket, ChartData, Gender, LawyerRecord, NameCount, RawRow, RawValue, Statistics};
