//! JSON-LD extraction
//!
//! Reads `<script type="application/ld+json">` blocks. Supports single
//! objects, arrays and (nested) `@graph` containers. Only objects whose
//! `@type` is an accepted course type contribute candidates.

use serde_json::{Map, Value};

use super::{Candidate, FieldExtractor, Source};
use crate::document::CoursePage;
use crate::fields::{CourseField, FieldSpec};

/// Course object properties and the field each one feeds
const PROPERTY_FIELDS: &[(&str, CourseField)] = &[
    ("name", CourseField::Name),
    ("description", CourseField::Description),
    ("timeToComplete", CourseField::Duration),
    ("duration", CourseField::Duration),
    ("educationalCredentialAwarded", CourseField::Qualification),
    ("educationalLevel", CourseField::StudyLevel),
    ("provider", CourseField::Provider),
    ("occupationalCategory", CourseField::CareerOutcomes),
    ("programPrerequisites", CourseField::EntryRequirements),
    ("coursePrerequisites", CourseField::EntryRequirements),
    ("courseCode", CourseField::CourseCode),
    ("programCode", CourseField::CourseCode),
    ("identifier", CourseField::CourseCode),
    ("numberOfCredits", CourseField::CreditPoints),
    ("educationalProgramMode", CourseField::StudyMode),
    ("courseMode", CourseField::StudyMode),
    ("startDate", CourseField::Intake),
    ("applicationStartDate", CourseField::Intake),
    ("location", CourseField::Campus),
];

/// Properties read from `hasCourseInstance` children
const INSTANCE_PROPERTY_FIELDS: &[(&str, CourseField)] = &[
    ("courseMode", CourseField::StudyMode),
    ("startDate", CourseField::Intake),
    ("location", CourseField::Campus),
    ("duration", CourseField::Duration),
];

/// Offer properties that say who a price applies to
const OFFER_AUDIENCE_KEYS: &[&str] = &["category", "name", "eligibleCustomerType", "description"];

/// Keys tried, in order, when a property holds an object instead of text
const OBJECT_TEXT_KEYS: &[&str] = &["name", "value", "@value", "price"];

pub struct JsonLdExtractor {
    accepted_types: Vec<String>,
}

impl JsonLdExtractor {
    pub fn new(accepted_types: Vec<String>) -> Self {
        Self { accepted_types }
    }

    /// Accepted course objects on the page, in document order.
    ///
    /// A block that is not valid JSON is skipped.
    pub fn course_objects(&self, page: &CoursePage) -> Vec<Map<String, Value>> {
        let mut objects = Vec::new();
        for json in page.structured_data() {
            collect_typed_objects(json, &mut objects);
        }

        objects.retain(|obj| self.is_accepted(obj));
        objects
    }

    fn is_accepted(&self, obj: &Map<String, Value>) -> bool {
        type_names(obj).any(|t| self.accepted_types.iter().any(|a| a == t))
    }
}

impl FieldExtractor for JsonLdExtractor {
    fn source(&self) -> Source {
        Source::StructuredData
    }

    fn extract(&self, page: &CoursePage, spec: &FieldSpec) -> Vec<Candidate> {
        self.course_objects(page)
            .iter()
            .flat_map(|obj| field_values(obj, spec.field))
            .map(|raw| Candidate::new(Source::StructuredData, raw))
            .collect()
    }
}

/// Recursively collect objects with `@type`, including those inside `@graph`
fn collect_typed_objects(value: &Value, result: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::Array(graph)) = obj.get("@graph") {
                for item in graph {
                    collect_typed_objects(item, result);
                }
            }
            if obj.contains_key("@type") {
                result.push(obj.clone());
            }
        }
        Value::Array(arr) => {
            for item in arr {
                collect_typed_objects(item, result);
            }
        }
        _ => {}
    }
}

/// `@type` values with any schema.org prefix stripped
fn type_names(obj: &Map<String, Value>) -> impl Iterator<Item = &str> {
    let types: Vec<&str> = match obj.get("@type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
        _ => vec![],
    };

    types.into_iter().map(|t| {
        t.strip_prefix("https://schema.org/")
            .or_else(|| t.strip_prefix("http://schema.org/"))
            .unwrap_or(t)
    })
}

fn field_values(obj: &Map<String, Value>, field: CourseField) -> Vec<String> {
    let mut values: Vec<String> = PROPERTY_FIELDS
        .iter()
        .filter(|(_, f)| *f == field)
        .filter_map(|(key, _)| obj.get(*key))
        .flat_map(value_texts)
        .collect();

    if matches!(
        field,
        CourseField::Fees | CourseField::FeesDomestic | CourseField::FeesInternational
    ) {
        values.extend(
            offers(obj)
                .filter(|offer| offer_field(offer) == field)
                .filter_map(offer_price)
                .flat_map(value_texts),
        );
    }

    for instance in obj.get("hasCourseInstance").into_iter().flat_map(objects_in) {
        values.extend(
            INSTANCE_PROPERTY_FIELDS
                .iter()
                .filter(|(_, f)| *f == field)
                .filter_map(|(key, _)| instance.get(*key))
                .flat_map(value_texts),
        );
    }

    values
}

fn objects_in(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Object(obj) => vec![obj],
        Value::Array(arr) => arr.iter().filter_map(Value::as_object).collect(),
        _ => vec![],
    }
}

fn offers(obj: &Map<String, Value>) -> impl Iterator<Item = &Map<String, Value>> {
    obj.get("offers").into_iter().flat_map(objects_in)
}

/// Route an offer's price to the international, domestic or generic fee field
fn offer_field(offer: &Map<String, Value>) -> CourseField {
    let mut audience: String = OFFER_AUDIENCE_KEYS
        .iter()
        .filter_map(|key| offer.get(*key))
        .flat_map(value_texts)
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(kind) = offer
        .get("audience")
        .and_then(|a| a.get("audienceType"))
        .and_then(Value::as_str)
    {
        audience.push(' ');
        audience.push_str(kind);
    }
    let audience = audience.to_lowercase();

    if audience.contains("international") || audience.contains("overseas") {
        CourseField::FeesInternational
    } else if ["domestic", "csp", "commonwealth"]
        .iter()
        .any(|k| audience.contains(k))
    {
        CourseField::FeesDomestic
    } else {
        CourseField::Fees
    }
}

fn offer_price(offer: &Map<String, Value>) -> Option<&Value> {
    offer.get("price").or_else(|| {
        offer
            .get("priceSpecification")
            .into_iter()
            .flat_map(objects_in)
            .find_map(|spec| spec.get("price"))
    })
}

/// Text carried by a JSON-LD property value
fn value_texts(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Value::Number(n) => vec![n.to_string()],
        Value::Array(arr) => arr.iter().flat_map(value_texts).collect(),
        Value::Object(obj) => OBJECT_TEXT_KEYS
            .iter()
            .find_map(|key| obj.get(*key))
            .map(value_texts)
            .unwrap_or_default(),
        _ => vec![],
    }
}
