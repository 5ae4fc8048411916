//! Site-specific selector extraction

use std::sync::Arc;

use super::{Candidate, FieldExtractor, Source};
use crate::document::CoursePage;
use crate::fields::FieldSpec;
use crate::profiles::SiteProfileTable;

pub struct SiteProfileExtractor {
    profiles: Arc<SiteProfileTable>,
}

impl SiteProfileExtractor {
    pub fn new(profiles: Arc<SiteProfileTable>) -> Self {
        Self { profiles }
    }
}

impl FieldExtractor for SiteProfileExtractor {
    fn source(&self) -> Source {
        Source::SiteProfile
    }

    /// Pages from hosts without a profile yield nothing
    fn extract(&self, page: &CoursePage, spec: &FieldSpec) -> Vec<Candidate> {
        let Some(profile) = page.host().and_then(|host| self.profiles.lookup(host)) else {
            return vec![];
        };

        page.first_match(profile.selectors(spec.field))
            .into_iter()
            .map(|raw| Candidate::new(Source::SiteProfile, raw))
            .collect()
    }
}
