//! Lookup tables as authored
//!
//! Tables are plain data deserialised from JSON. The defaults are bundled
//! from `config/builtin_tables.json`; hosts may supply their own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fields::CourseField;
use crate::normalize::{Normalizer, ValidatorConfig};

const BUILTIN_TABLES: &str = include_str!("../config/builtin_tables.json");

/// Complete configuration surface of the resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// One entry per canonical field
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub site_profiles: Vec<SiteProfileConfig>,
    #[serde(default)]
    pub structured_data: StructuredDataConfig,
}

impl ResolverConfig {
    /// The bundled default tables
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TABLES)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn field_mut(&mut self, field: CourseField) -> Option<&mut FieldConfig> {
        self.fields.iter_mut().find(|f| f.field == field.as_str())
    }
}

/// FieldSpec as written in the tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Canonical field name, e.g. `fees_domestic`
    pub field: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub normalizer: Normalizer,
    #[serde(default)]
    pub unit: Option<String>,
    /// Selector expressions, optionally suffixed with `::text` or `::attr(name)`
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
}

/// A text pattern; the templated form rebuilds the value from named groups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternConfig {
    Plain(String),
    Templated { pattern: String, template: String },
}

/// Per-domain selector overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfileConfig {
    /// Host, matched exactly or as a suffix (`unsw.edu.au` covers `www.unsw.edu.au`)
    pub domain: String,
    /// Field name -> selectors tried in listed order
    pub selectors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredDataConfig {
    /// `@type` values whose objects describe a course
    pub accepted_types: Vec<String>,
}

impl Default for StructuredDataConfig {
    fn default() -> Self {
        Self {
            accepted_types: vec![
                "Course".to_string(),
                "EducationalOccupationalProgram".to_string(),
                "Program".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_cover_every_field() {
        let config = ResolverConfig::builtin().unwrap();

        for field in CourseField::ALL {
            let matching = config.fields.iter().filter(|f| f.field == field.as_str()).count();
            assert_eq!(matching, 1, "{field} should be specified once");
        }
        assert_eq!(
            config.structured_data.accepted_types,
            StructuredDataConfig::default().accepted_types
        );
        assert!(config.site_profiles.iter().any(|p| p.domain == "unsw.edu.au"));
    }

    #[test]
    fn test_pattern_config_forms() {
        let json = r#"
        {
            "fields": [{
                "field": "duration",
                "validator": {"kind": "text", "min_len": 1},
                "patterns": [
                    "(\\d+) years",
                    {"pattern": "(?P<ft>\\d+) yrs", "template": "${ft} years"}
                ]
            }]
        }
        "#;
        let config = ResolverConfig::from_json(json).unwrap();
        let field = &config.fields[0];

        assert!(matches!(field.patterns[0], PatternConfig::Plain(_)));
        assert!(matches!(field.patterns[1], PatternConfig::Templated { .. }));
        assert_eq!(field.normalizer, Normalizer::Text);
        assert!(config.site_profiles.is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(ResolverConfig::from_json("{\"fields\": 3}").is_err());
    }
}
