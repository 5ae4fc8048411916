//! Course records and their assembly

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ResolverConfig;
use crate::document::CoursePage;
use crate::error::Result;
use crate::extractors::{default_extractors, Source};
use crate::fields::{CourseField, FieldSpec, FieldTable};
use crate::profiles::{SiteProfile, SiteProfileTable};
use crate::resolver::FieldResolver;

/// Resolution outcome for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedField {
    Resolved {
        /// Normalized value
        value: String,
        /// Strategy that produced it
        source: Source,
        /// Text as matched on the page
        raw: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Unresolved,
}

impl ResolvedField {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedField::Resolved { .. })
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            ResolvedField::Resolved { value, .. } => Some(value),
            ResolvedField::Unresolved => None,
        }
    }

    pub fn source(&self) -> Option<Source> {
        match self {
            ResolvedField::Resolved { source, .. } => Some(*source),
            ResolvedField::Unresolved => None,
        }
    }
}

/// One entry per canonical field, resolved or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub url: String,
    pub fields: BTreeMap<CourseField, ResolvedField>,
}

impl CourseRecord {
    pub fn get(&self, field: CourseField) -> Option<&ResolvedField> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: CourseField) -> Option<&str> {
        self.get(field).and_then(ResolvedField::value)
    }

    /// Provenance of a resolved field
    pub fn source(&self, field: CourseField) -> Option<Source> {
        self.get(field).and_then(ResolvedField::source)
    }

    pub fn resolved_count(&self) -> usize {
        self.fields.values().filter(|f| f.is_resolved()).count()
    }

    pub fn unresolved_fields(&self) -> Vec<CourseField> {
        self.fields
            .iter()
            .filter(|(_, resolved)| !resolved.is_resolved())
            .map(|(field, _)| *field)
            .collect()
    }
}

/// Builds complete course records from parsed pages.
///
/// Holds the compiled tables; build once and share across threads.
pub struct RecordAssembler {
    profiles: Arc<SiteProfileTable>,
    resolver: FieldResolver,
}

impl RecordAssembler {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let fields = Arc::new(FieldTable::compile(&config.fields)?);
        let profiles = Arc::new(SiteProfileTable::compile(&config.site_profiles)?);
        let extractors = default_extractors(
            fields.clone(),
            profiles.clone(),
            &config.structured_data.accepted_types,
        );

        Ok(Self {
            profiles,
            resolver: FieldResolver::new(fields, extractors),
        })
    }

    pub fn with_builtin_tables() -> Result<Self> {
        Self::new(&ResolverConfig::builtin()?)
    }

    /// Resolve every canonical field of `page`
    #[instrument(skip_all, fields(url = page.url()))]
    pub fn assemble(&self, page: &CoursePage) -> CourseRecord {
        let fields: BTreeMap<CourseField, ResolvedField> = CourseField::ALL
            .into_iter()
            .map(|field| (field, self.resolver.resolve(page, field)))
            .collect();

        let record = CourseRecord {
            url: page.url().to_string(),
            fields,
        };
        debug!(
            resolved = record.resolved_count(),
            total = CourseField::ALL.len(),
            "assembled course record"
        );
        record
    }

    pub fn resolve_field(&self, page: &CoursePage, field: CourseField) -> ResolvedField {
        self.resolver.resolve(page, field)
    }

    pub fn field_spec(&self, field: CourseField) -> &FieldSpec {
        self.resolver.fields().get(field)
    }

    /// Site profile for a host or URL, if one is configured
    pub fn site_profile(&self, host_or_url: &str) -> Option<&SiteProfile> {
        self.profiles.lookup(host_or_url)
    }
}
