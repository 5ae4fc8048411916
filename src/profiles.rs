//! Site profiles: per-domain selector overrides

use std::collections::BTreeMap;

use url::Url;

use crate::config::SiteProfileConfig;
use crate::document::Query;
use crate::error::Result;
use crate::fields::CourseField;

/// Selector overrides for one university site
#[derive(Debug, Clone)]
pub struct SiteProfile {
    domain: String,
    selectors: BTreeMap<CourseField, Vec<Query>>,
}

impl SiteProfile {
    pub fn compile(config: &SiteProfileConfig) -> Result<Self> {
        let mut selectors = BTreeMap::new();
        for (name, expressions) in &config.selectors {
            let field: CourseField = name.parse()?;
            let queries = expressions
                .iter()
                .map(|s| Query::parse(s))
                .collect::<Result<Vec<_>>>()?;
            selectors.insert(field, queries);
        }

        Ok(Self {
            domain: normalize_host(&config.domain).unwrap_or_else(|| config.domain.to_lowercase()),
            selectors,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Selectors for `field`, empty if the profile does not cover it
    pub fn selectors(&self, field: CourseField) -> &[Query] {
        self.selectors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn matches_exactly(&self, host: &str) -> bool {
        host == self.domain
    }

    fn matches_suffix(&self, host: &str) -> bool {
        host.strip_suffix(self.domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// All known site profiles
#[derive(Debug, Clone, Default)]
pub struct SiteProfileTable {
    profiles: Vec<SiteProfile>,
}

impl SiteProfileTable {
    pub fn compile(configs: &[SiteProfileConfig]) -> Result<Self> {
        Ok(Self {
            profiles: configs.iter().map(SiteProfile::compile).collect::<Result<_>>()?,
        })
    }

    /// Profile for a host or URL: an exact host match first, otherwise the
    /// longest matching domain suffix
    pub fn lookup(&self, host_or_url: &str) -> Option<&SiteProfile> {
        let host = normalize_host(host_or_url)?;

        self.profiles
            .iter()
            .find(|p| p.matches_exactly(&host))
            .or_else(|| {
                self.profiles
                    .iter()
                    .filter(|p| p.matches_suffix(&host))
                    .max_by_key(|p| p.domain.len())
            })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Lowercased host of a URL or bare host name, without `www.` or a trailing dot
pub fn normalize_host(input: &str) -> Option<String> {
    let input = input.trim();
    let parsed = Url::parse(input)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| Url::parse(&format!("http://{input}")).ok())?;

    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    (!host.is_empty()).then_some(host)
}
