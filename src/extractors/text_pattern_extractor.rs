//! Regular-expression fallback over the page's visible text

use regex::{Captures, Regex};

use super::{Candidate, FieldExtractor, Source};
use crate::config::PatternConfig;
use crate::document::CoursePage;
use crate::error::{ConfigError, Result};
use crate::fields::{CourseField, FieldSpec};

/// A compiled pattern and how to build a value from its captures
#[derive(Debug, Clone)]
pub struct TextPattern {
    regex: Regex,
    /// `$name` / `${name}` expansion; without one, group 1 (or the whole match)
    template: Option<String>,
}

impl TextPattern {
    pub fn compile(field: CourseField, config: &PatternConfig) -> Result<Self> {
        let (pattern, template) = match config {
            PatternConfig::Plain(pattern) => (pattern, None),
            PatternConfig::Templated { pattern, template } => (pattern, Some(template.clone())),
        };
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { field, source })?;

        Ok(Self { regex, template })
    }

    /// Values for every match in `text`, in position order
    pub fn extract_all(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .map(|caps| self.value(&caps))
            .filter(|value| !value.trim().is_empty())
            .collect()
    }

    fn value(&self, caps: &Captures<'_>) -> String {
        match &self.template {
            Some(template) => {
                let mut out = String::new();
                caps.expand(template, &mut out);
                out
            }
            None => caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

pub struct TextPatternExtractor;

impl FieldExtractor for TextPatternExtractor {
    fn source(&self) -> Source {
        Source::TextPattern
    }

    /// Every match of every pattern: pattern order first, then page position
    fn extract(&self, page: &CoursePage, spec: &FieldSpec) -> Vec<Candidate> {
        if spec.patterns.is_empty() {
            return vec![];
        }
        let text = page.visible_text();

        spec.patterns
            .iter()
            .flat_map(|pattern| pattern.extract_all(text))
            .map(|raw| Candidate::new(Source::TextPattern, raw))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::fields::FieldTable;

    fn first_match(text: &str, field: CourseField) -> Option<String> {
        let config = ResolverConfig::builtin().unwrap();
        let table = FieldTable::compile(&config.fields).unwrap();
        let html = format!("<html><body><p>{text}</p></body></html>");
        let page = CoursePage::parse(&html, "https://example.edu.au/course");

        TextPatternExtractor
            .extract(&page, table.get(field))
            .into_iter()
            .next()
            .map(|c| c.raw)
    }

    // First candidate the field's normalizer and validator accept
    fn first_accepted(text: &str, field: CourseField) -> Option<String> {
        let config = ResolverConfig::builtin().unwrap();
        let table = FieldTable::compile(&config.fields).unwrap();
        let html = format!("<html><body><p>{text}</p></body></html>");
        let page = CoursePage::parse(&html, "https://example.edu.au/course");
        let spec = table.get(field);

        TextPatternExtractor
            .extract(&page, spec)
            .into_iter()
            .find_map(|c| spec.accept(&c.raw))
    }

    #[test]
    fn test_template_pattern() {
        let pattern = TextPattern::compile(
            CourseField::Duration,
            &PatternConfig::Templated {
                pattern: r"(?P<ft>\d+) yrs FT".to_string(),
                template: "${ft} years full-time".to_string(),
            },
        )
        .unwrap();

        assert_eq!(pattern.extract_all("3 yrs FT, or 4 yrs FT"), vec!["3 years full-time", "4 years full-time"]);
    }

    #[test]
    fn test_plain_pattern_uses_first_group() {
        let pattern =
            TextPattern::compile(CourseField::Atar, &PatternConfig::Plain(r"ATAR (\d+)".to_string()))
                .unwrap();
        assert_eq!(pattern.extract_all("ATAR 80 and ATAR 90"), vec!["80", "90"]);

        let whole = TextPattern::compile(CourseField::Atar, &PatternConfig::Plain(r"\d+".to_string()))
            .unwrap();
        assert_eq!(whole.extract_all("rank 75"), vec!["75"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = TextPattern::compile(CourseField::Intake, &PatternConfig::Plain("(".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { field: CourseField::Intake, .. }));
    }

    #[test]
    fn test_fee_patterns() {
        assert_eq!(
            first_match("Domestic fee: $32,000 per year", CourseField::FeesDomestic).as_deref(),
            Some("32,000")
        );
        assert_eq!(
            first_match("Commonwealth supported place: $9,350 per year", CourseField::FeesDomestic)
                .as_deref(),
            Some("9,350")
        );
        assert_eq!(
            first_match("International students pay A$41,500 a year", CourseField::FeesInternational)
                .as_deref(),
            Some("41,500")
        );
    }

    #[test]
    fn test_duration_patterns() {
        assert_eq!(
            first_match("Duration: 3 years full-time or 6 years part-time", CourseField::Duration)
                .as_deref(),
            Some("3 years full-time / 6 years part-time")
        );
        assert_eq!(
            first_match("Study 3 years full time or equivalent part-time", CourseField::Duration)
                .as_deref(),
            Some("3 years full-time")
        );
        assert_eq!(
            first_match("Full-time: 4 years", CourseField::Duration).as_deref(),
            Some("4 years full-time")
        );
        assert_eq!(
            first_match("Duration 18 months", CourseField::Duration).as_deref(),
            Some("18 months")
        );
    }

    #[test]
    fn test_credit_points_atar_and_codes() {
        assert_eq!(
            first_match("Complete 144 credit points of study", CourseField::CreditPoints).as_deref(),
            Some("144")
        );
        assert_eq!(first_match("Guaranteed ATAR: 80.00", CourseField::Atar).as_deref(), Some("80.00"));
        assert_eq!(
            first_match("Course code: BN01 | CRICOS: 083958G", CourseField::CourseCode).as_deref(),
            Some("BN01")
        );
        assert_eq!(
            first_match("CRICOS code 083958G", CourseField::CourseCode).as_deref(),
            Some("083958G")
        );
    }

    #[test]
    fn test_no_patterns_no_candidates() {
        assert_eq!(first_match("Bachelor of Arts", CourseField::Name), None);
    }

    #[test]
    fn test_fees_without_currency_symbol() {
        assert_eq!(
            first_match("Domestic fee: 32,000 per year", CourseField::FeesDomestic).as_deref(),
            Some("32,000")
        );
        assert_eq!(
            first_match("International tuition fee: 40,000 per year", CourseField::FeesInternational)
                .as_deref(),
            Some("40,000")
        );
        assert_eq!(
            first_accepted("Domestic fee: 32,000 per year", CourseField::FeesDomestic).as_deref(),
            Some("32000")
        );
        assert_eq!(
            first_accepted("International tuition fee: 40,000 per year", CourseField::FeesInternational)
                .as_deref(),
            Some("40000")
        );
    }

    #[test]
    fn test_overseas_fee() {
        assert_eq!(
            first_match("Overseas students: A$38,000 per year", CourseField::FeesInternational)
                .as_deref(),
            Some("38,000")
        );
        assert_eq!(
            first_match("Overseas fee: 38,000", CourseField::FeesInternational).as_deref(),
            Some("38,000")
        );
    }

    #[test]
    fn test_duration_in_separate_clauses() {
        assert_eq!(
            first_match("Full-time: 3 years. Part-time: 6 years.", CourseField::Duration).as_deref(),
            Some("3 years full-time / 6 years part-time")
        );
        assert_eq!(
            first_match("Duration: 3 years full-time, or 6 years part-time", CourseField::Duration)
                .as_deref(),
            Some("3 years full-time / 6 years part-time")
        );
    }

    #[test]
    fn test_duration_range() {
        assert_eq!(
            first_match("Study 3-4 years full-time", CourseField::Duration).as_deref(),
            Some("3-4 years full-time")
        );
        assert_eq!(
            first_match("Study 3 to 4 years full-time", CourseField::Duration).as_deref(),
            Some("3 to 4 years full-time")
        );
        assert_eq!(
            first_accepted("Study 3 to 4 years full-time", CourseField::Duration).as_deref(),
            Some("3-4 years full-time")
        );
    }

    #[test]
    fn test_credit_point_abbreviations() {
        assert_eq!(
            first_match("Total: 144CP", CourseField::CreditPoints).as_deref(),
            Some("144")
        );
        assert_eq!(
            first_match("Complete 24 units over two years", CourseField::CreditPoints).as_deref(),
            Some("24")
        );
        assert_eq!(
            first_accepted("Complete 24 units over two years", CourseField::CreditPoints).as_deref(),
            Some("24")
        );
    }

    #[test]
    fn test_unlabelled_campus_and_study_mode() {
        let text = "Study this degree at our Brisbane and Melbourne campuses, \
                    full-time or part-time, on campus or online.";

        assert_eq!(
            first_accepted(text, CourseField::Campus).as_deref(),
            Some("Brisbane and Melbourne")
        );
        assert_eq!(
            first_accepted(text, CourseField::StudyMode).as_deref(),
            Some("Full-time, Part-time, On-campus, Online")
        );
        assert_eq!(
            first_accepted("Classes run at North Sydney & Strathfield.", CourseField::Campus)
                .as_deref(),
            Some("North Sydney & Strathfield")
        );
    }

    #[test]
    fn test_award_and_study_level_patterns() {
        assert_eq!(
            first_accepted("Award: Graduate Certificate in Education", CourseField::Qualification)
                .as_deref(),
            Some("Graduate Certificate")
        );
        assert_eq!(
            first_accepted("Explore our postgraduate coursework degrees", CourseField::StudyLevel)
                .as_deref(),
            Some("Postgraduate")
        );
    }
}
