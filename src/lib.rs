pub mod comparands;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod members;
pub mod path;
pub mod pattern;
pub mod reporter;
pub mod rules;
pub mod value;
mod parser;

use std::sync::Arc;

pub use comparands::Comparands;
pub use config::{Configuration, CyclicReferenceHandling, EnumEquivalency, Options, Typing};
pub use errors::{ConfigError, EquivalencyFailure, Result};
pub use members::{Member, MemberKind, TypeDescriptor, Visibility};
pub use path::{Path, Segment};
pub use pattern::{PathPattern, Selector};
pub use reporter::{Mismatch, MismatchCollector, Report, Reporter};
pub use rules::Candidate;
pub use value::{EnumValue, ObjectRef, Scalar, Value};

/// Compares `subject` with `expectation` under the options produced by
/// `configure`. Returns every mismatch found; an empty list means the graphs
/// are equivalent.
///
/// Configuration errors (such as a selector that does not name a member) are
/// returned before the graphs are touched.
pub fn compare<F>(subject: &Value, expectation: &Value, configure: F) -> Result<Vec<Mismatch>>
where
    F: FnOnce(Options) -> Options,
{
    let config = configure(Options::new()).build()?;
    Ok(engine::compare_with(subject, expectation, &config))
}

/// Compares with an already built configuration.
pub fn compare_with(subject: &Value, expectation: &Value, config: &Configuration) -> Vec<Mismatch> {
    engine::compare_with(subject, expectation, config)
}

/// A reusable, shareable comparison setup.
#[derive(Clone)]
pub struct Equivalency {
    config: Arc<Configuration>,
    subject_name: String,
}

impl Default for Equivalency {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl Equivalency {
    pub fn new(config: Configuration) -> Self {
        Self {
            config: Arc::new(config),
            subject_name: "subject".to_string(),
        }
    }

    pub fn configure<F>(configure: F) -> Result<Self>
    where
        F: FnOnce(Options) -> Options,
    {
        Ok(Self::new(configure(Options::new()).build()?))
    }

    pub fn named(mut self, subject_name: impl Into<String>) -> Self {
        self.subject_name = subject_name.into();
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn compare(&self, subject: &Value, expectation: &Value) -> Vec<Mismatch> {
        engine::compare_with(subject, expectation, &self.config)
    }

    /// Fails with a rendered report when the graphs are not equivalent.
    pub fn assert_equivalent(
        &self,
        subject: &Value,
        expectation: &Value,
        because: &str,
    ) -> std::result::Result<(), EquivalencyFailure> {
        let mismatches = self.compare(subject, expectation);
        if mismatches.is_empty() {
            return Ok(());
        }
        let message = Report::new(&mismatches)
            .subject_name(self.subject_name.clone())
            .because(because)
            .with_configuration(&self.config)
            .to_string();
        Err(EquivalencyFailure { mismatches, message })
    }
}
