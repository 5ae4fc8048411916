//! Canonical course fields and their specs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;
use crate::document::Query;
use crate::error::{ConfigError, Result};
use crate::extractors::TextPattern;
use crate::normalize::{Normalizer, Validator};

/// Labels longer than this are prose, not table keys
const MAX_LABEL_LEN: usize = 80;

/// Every attribute a course record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseField {
    Name,
    Description,
    Duration,
    Fees,
    FeesDomestic,
    FeesInternational,
    Atar,
    CreditPoints,
    CourseCode,
    Intake,
    Campus,
    StudyMode,
    EntryRequirements,
    Qualification,
    StudyLevel,
    Provider,
    CareerOutcomes,
}

impl CourseField {
    pub const ALL: [CourseField; 17] = [
        CourseField::Name,
        CourseField::Description,
        CourseField::Duration,
        CourseField::Fees,
        CourseField::FeesDomestic,
        CourseField::FeesInternational,
        CourseField::Atar,
        CourseField::CreditPoints,
        CourseField::CourseCode,
        CourseField::Intake,
        CourseField::Campus,
        CourseField::StudyMode,
        CourseField::EntryRequirements,
        CourseField::Qualification,
        CourseField::StudyLevel,
        CourseField::Provider,
        CourseField::CareerOutcomes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CourseField::Name => "name",
            CourseField::Description => "description",
            CourseField::Duration => "duration",
            CourseField::Fees => "fees",
            CourseField::FeesDomestic => "fees_domestic",
            CourseField::FeesInternational => "fees_international",
            CourseField::Atar => "atar",
            CourseField::CreditPoints => "credit_points",
            CourseField::CourseCode => "course_code",
            CourseField::Intake => "intake",
            CourseField::Campus => "campus",
            CourseField::StudyMode => "study_mode",
            CourseField::EntryRequirements => "entry_requirements",
            CourseField::Qualification => "qualification",
            CourseField::StudyLevel => "study_level",
            CourseField::Provider => "provider",
            CourseField::CareerOutcomes => "career_outcomes",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        CourseField::ALL
            .into_iter()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownField(s.to_string()))
    }
}

/// Everything the resolver knows about one field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: CourseField,
    /// Label synonyms, already normalized with [`normalize_label`]
    pub synonyms: Vec<String>,
    pub validator: Validator,
    pub normalizer: Normalizer,
    pub unit: Option<String>,
    /// Site-agnostic selectors, tried in order
    pub selectors: Vec<Query>,
    /// Text fallback patterns, tried in order
    pub patterns: Vec<TextPattern>,
}

impl FieldSpec {
    pub fn compile(config: &FieldConfig) -> Result<Self> {
        let field: CourseField = config.field.parse()?;

        let mut synonyms: Vec<String> = Vec::new();
        for synonym in config.synonyms.iter().map(|s| normalize_label(s)) {
            if !synonym.is_empty() && !synonyms.contains(&synonym) {
                synonyms.push(synonym);
            }
        }

        Ok(Self {
            field,
            synonyms,
            validator: Validator::compile(field, &config.validator)?,
            normalizer: config.normalizer,
            unit: config.unit.clone(),
            selectors: config
                .selectors
                .iter()
                .map(|s| Query::parse(s))
                .collect::<Result<_>>()?,
            patterns: config
                .patterns
                .iter()
                .map(|p| TextPattern::compile(field, p))
                .collect::<Result<_>>()?,
        })
    }

    /// Normalize then validate a raw candidate
    pub fn accept(&self, raw: &str) -> Option<String> {
        self.normalizer
            .apply(raw)
            .filter(|value| self.validator.accepts(value))
    }
}

/// Outcome of matching a label against every field's synonyms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelMatch {
    Field(CourseField),
    /// Equally specific synonyms of several fields matched
    Ambiguous(Vec<CourseField>),
    None,
}

/// The full FieldSpec table, one spec per canonical field
#[derive(Debug, Clone)]
pub struct FieldTable {
    specs: Vec<FieldSpec>,
}

impl FieldTable {
    pub fn compile(configs: &[FieldConfig]) -> Result<Self> {
        let mut slots: Vec<Option<FieldSpec>> = vec![None; CourseField::ALL.len()];

        for config in configs {
            let spec = FieldSpec::compile(config)?;
            let slot = &mut slots[spec.field.index()];
            if slot.is_some() {
                return Err(ConfigError::DuplicateField(spec.field));
            }
            *slot = Some(spec);
        }

        let specs = slots
            .into_iter()
            .zip(CourseField::ALL)
            .map(|(slot, field)| slot.ok_or(ConfigError::MissingField(field)))
            .collect::<Result<_>>()?;

        Ok(Self { specs })
    }

    pub fn get(&self, field: CourseField) -> &FieldSpec {
        &self.specs[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    /// Route a table label to a field.
    ///
    /// An exact synonym match outranks a substring match; within the same
    /// kind, the longer synonym wins. Distinct fields tied at the best rank
    /// make the label ambiguous.
    pub fn match_label(&self, label: &str) -> LabelMatch {
        let label = normalize_label(label);
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return LabelMatch::None;
        }
        let padded = format!(" {label} ");

        let mut best: Option<(bool, usize)> = None;
        let mut fields: Vec<CourseField> = Vec::new();

        for spec in &self.specs {
            for synonym in &spec.synonyms {
                let rank = if *synonym == label {
                    (true, synonym.chars().count())
                } else if padded.contains(&format!(" {synonym} ")) {
                    (false, synonym.chars().count())
                } else {
                    continue;
                };

                match best.cmp(&Some(rank)) {
                    std::cmp::Ordering::Less => {
                        best = Some(rank);
                        fields.clear();
                        fields.push(spec.field);
                    }
                    std::cmp::Ordering::Equal if !fields.contains(&spec.field) => {
                        fields.push(spec.field);
                    }
                    _ => {}
                }
            }
        }

        match fields.as_slice() {
            [] => LabelMatch::None,
            [field] => LabelMatch::Field(*field),
            _ => LabelMatch::Ambiguous(fields),
        }
    }
}

/// Characters dropped outright so `Fee(s)` reads as `fees`
const ELIDED_PUNCTUATION: &[char] = &['(', ')', '[', ']', '{', '}', '\'', '\u{2019}'];

/// Lowercase, strip punctuation, collapse whitespace
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| !ELIDED_PUNCTUATION.contains(c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
