//! Course page resolution engine for the university course crawler
//!
//! Turns a parsed course page into a normalized course record. Each field
//! is resolved by trying, in order:
//! - JSON-LD structured data (with @graph support)
//! - Site profile selectors for the page's university
//! - Table, definition list and label/value pairs
//! - Generic CSS selectors
//! - Text patterns over the visible page text
//!
//! and keeping the first candidate that passes the field's validator.

pub mod config;
pub mod document;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod fields;
pub mod normalize;
pub mod profiles;
pub mod record;
pub mod resolver;

pub use config::ResolverConfig;
pub use document::CoursePage;
pub use error::{ConfigError, Result};
pub use extractors::{Candidate, FieldExtractor, Source};
pub use fields::{CourseField, FieldSpec, FieldTable};
pub use profiles::{SiteProfile, SiteProfileTable};
pub use record::{CourseRecord, RecordAssembler, ResolvedField};
pub use resolver::FieldResolver;
