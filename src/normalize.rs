//! Value normalizers and validators
//!
//! A normalizer turns raw matched text into the canonical textual form of a
//! field, or rejects it. A validator then checks the canonical form's shape
//! or range.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::collapse_whitespace;
use crate::error::{ConfigError, Result};
use crate::fields::CourseField;

static CURRENCY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:A?\$|AUD|USD)\s*(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?").unwrap()
});
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?").unwrap());
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").unwrap());
static SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}(?:\.\d{1,2})?\b").unwrap());
static ISO_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+(?:\.\d+)?)Y)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)W)?(?:T.*)?$").unwrap()
});
static NUMBER_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:-|–|to)\s*(\d+(?:\.\d+)?)").unwrap()
});
static FULL_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfull[\s-]?time\b").unwrap());
static PART_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpart[\s-]?time\b").unwrap());
static CODE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[A-Z]{1,8}\d{1,6}[A-Z]?|\d{6}[A-Z]?)\b").unwrap());

/// Canonical study modes and the keywords that signal them, in output order
const STUDY_MODES: &[(&str, &[&str])] = &[
    ("Full-time", &["full-time", "full time", "fulltime"]),
    ("Part-time", &["part-time", "part time", "parttime"]),
    (
        "On-campus",
        &["on-campus", "on campus", "face-to-face", "face to face", "in person", "in-person"],
    ),
    ("Online", &["online", "distance", "remote"]),
    ("Flexible", &["flexible", "blended", "hybrid", "mixed mode", "multi-modal"]),
];

/// Course types by the keywords of a course name; the first hit wins
const COURSE_TYPES: &[(&str, &[&str])] = &[
    ("Bachelor Degree", &["bachelor"]),
    ("Master Degree", &["master"]),
    ("Professional Doctorate", &["juris doctor"]),
    ("Graduate Certificate", &["graduate certificate"]),
    ("Graduate Diploma", &["graduate diploma"]),
    ("Associate Degree", &["associate degree"]),
    ("Diploma", &["diploma"]),
    ("Certificate", &["certificate"]),
    ("Doctorate", &["doctorate", "doctor of philosophy", "phd"]),
];

/// Study levels by the keywords of a course name or URL; the first hit wins
const STUDY_LEVELS: &[(&str, &[&str])] = &[
    (
        "Postgraduate",
        &[
            "postgraduate",
            "master",
            "graduate certificate",
            "graduate diploma",
            "doctorate",
            "doctor of philosophy",
            "phd",
            "juris doctor",
        ],
    ),
    ("Undergraduate", &["undergraduate", "bachelor", "associate degree", "diploma"]),
    ("Short Course", &["short course", "microcredential", "certificate"]),
];

/// Field-specific normalizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    #[default]
    Text,
    Currency,
    Integer,
    Score,
    Duration,
    Code,
    StudyMode,
    /// Course type named by a course title, e.g. `Bachelor Degree`
    CourseType,
    /// `Undergraduate`, `Postgraduate` or `Short Course`
    StudyLevel,
}

impl Normalizer {
    /// Canonical form of `raw`, or `None` when it cannot hold a value of this kind
    pub fn apply(self, raw: &str) -> Option<String> {
        let text = collapse_whitespace(raw);
        if text.is_empty() {
            return None;
        }

        match self {
            Normalizer::Text => {
                let trimmed = text.trim_end_matches(':').trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Normalizer::Currency => normalize_currency(&text),
            Normalizer::Integer => INTEGER
                .find(&text)
                .map(|m| m.as_str().replace(',', "")),
            Normalizer::Score => Some(
                SCORE
                    .find(&text)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or(text),
            ),
            Normalizer::Duration => Some(normalize_duration(&text)),
            Normalizer::Code => CODE_TOKEN
                .find(&text.to_uppercase())
                .map(|m| m.as_str().to_string()),
            Normalizer::StudyMode => normalize_study_mode(&text),
            Normalizer::CourseType => first_keyword_hit(&text, COURSE_TYPES),
            Normalizer::StudyLevel => first_keyword_hit(&text, STUDY_LEVELS),
        }
    }
}

fn normalize_currency(text: &str) -> Option<String> {
    let caps = CURRENCY_AMOUNT
        .captures(text)
        .or_else(|| AMOUNT.captures(text))?;

    let whole = caps.get(1)?.as_str().replace(',', "");
    match caps.get(2).map(|m| m.as_str()) {
        Some(cents) if cents.chars().any(|c| c != '0') => Some(format!("{whole}.{cents}")),
        _ => Some(whole),
    }
}

fn normalize_duration(text: &str) -> String {
    if let Some(caps) = ISO_PERIOD.captures(text) {
        let years: f64 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0);
        let months: f64 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0);
        let weeks: f64 = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0);

        if years > 0.0 {
            return plural(years + months / 12.0, "year");
        }
        if months > 0.0 {
            return plural(months, "month");
        }
        if weeks > 0.0 {
            return plural(weeks, "week");
        }
    }

    let text = NUMBER_RANGE.replace_all(text, "$1-$2");
    let text = FULL_TIME.replace_all(&text, "full-time");
    PART_TIME.replace_all(&text, "part-time").into_owned()
}

fn plural(amount: f64, unit: &str) -> String {
    let amount = (amount * 100.0).round() / 100.0;
    if amount == 1.0 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

fn normalize_study_mode(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let modes: Vec<&str> = STUDY_MODES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(mode, _)| *mode)
        .collect();

    (!modes.is_empty()).then(|| modes.join(", "))
}

// Matches against lowercased words, so `graduate-certificate` in a URL counts
fn first_keyword_hit(text: &str, table: &[(&str, &[&str])]) -> Option<String> {
    let words = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let padded = format!(" {words} ");

    table
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| padded.contains(&format!(" {k}")))
        })
        .map(|(canonical, _)| canonical.to_string())
}

/// Validator as written in the tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorConfig {
    Range {
        min: f64,
        max: f64,
        #[serde(default)]
        integer: bool,
        #[serde(default)]
        accept_phrases: Vec<String>,
    },
    Pattern {
        regex: String,
    },
    Enumerated {
        allowed: Vec<String>,
    },
    Text {
        #[serde(default)]
        min_len: usize,
        #[serde(default = "default_max_len")]
        max_len: usize,
    },
}

fn default_max_len() -> usize {
    1000
}

/// Compiled validator
#[derive(Debug, Clone)]
pub enum Validator {
    /// Inclusive numeric range; values mentioning an accepted phrase pass unchecked
    Range {
        min: f64,
        max: f64,
        integer: bool,
        accept_phrases: Vec<String>,
    },
    Pattern(Regex),
    /// Every comma-separated item must be one of the allowed values
    Enumerated(Vec<String>),
    Text { min_len: usize, max_len: usize },
}

impl Validator {
    pub fn compile(field: CourseField, config: &ValidatorConfig) -> Result<Self> {
        Ok(match config {
            ValidatorConfig::Range {
                min,
                max,
                integer,
                accept_phrases,
            } => Validator::Range {
                min: *min,
                max: *max,
                integer: *integer,
                accept_phrases: accept_phrases.iter().map(|p| p.to_lowercase()).collect(),
            },
            ValidatorConfig::Pattern { regex } => Validator::Pattern(
                Regex::new(regex).map_err(|source| ConfigError::InvalidPattern { field, source })?,
            ),
            ValidatorConfig::Enumerated { allowed } => Validator::Enumerated(allowed.clone()),
            ValidatorConfig::Text { min_len, max_len } => Validator::Text {
                min_len: *min_len,
                max_len: *max_len,
            },
        })
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Validator::Range {
                min,
                max,
                integer,
                accept_phrases,
            } => {
                let lower = value.to_lowercase();
                if accept_phrases.iter().any(|p| lower.contains(p.as_str())) {
                    return true;
                }
                match value.parse::<f64>() {
                    Ok(n) => n >= *min && n <= *max && (!*integer || n.fract() == 0.0),
                    Err(_) => false,
                }
            }
            Validator::Pattern(regex) => regex.is_match(value),
            Validator::Enumerated(allowed) => value.split(',').map(str::trim).all(|item| {
                !item.is_empty() && allowed.iter().any(|a| a.eq_ignore_ascii_case(item))
            }),
            Validator::Text { min_len, max_len } => {
                let len = value.chars().count();
                len >= *min_len && len <= *max_len
            }
        }
    }
}
