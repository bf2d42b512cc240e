use crate::config::Configuration;
use crate::path::{Path, Segment};
use serde::Serialize;
use std::fmt;

/// One structural difference.
///
/// `template` holds positional placeholders: `{0}` for the path, `{1}` for the
/// expected value and `{2}` for the actual value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub path: Path,
    pub template: String,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    pub fn new(
        path: Path,
        template: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self {
            path,
            template: template.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Substitutes the placeholders, naming the root of the graph `subject_name`.
    pub fn render(&self, subject_name: &str) -> String {
        let location = match self.path.segments().first() {
            None => subject_name.to_string(),
            Some(Segment::Member(_)) => format!("{subject_name}.{}", self.path),
            Some(_) => format!("{subject_name}{}", self.path),
        };
        substitute(&self.template, &[&location, &self.expected, &self.actual])
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render("subject"))
    }
}

/// Single pass over the template so substituted text is never expanded again.
fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|i| (i, close)));
        match placeholder {
            Some((i, close)) if i < args.len() => {
                out.push_str(args[i]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Receives mismatches as the traversal finds them.
pub trait Reporter {
    fn append(&mut self, mismatch: Mismatch);
}

/// Keeps every mismatch in the order it was reported, duplicates included.
#[derive(Debug, Default)]
pub struct MismatchCollector {
    mismatches: Vec<Mismatch>,
}

impl MismatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn into_mismatches(self) -> Vec<Mismatch> {
        self.mismatches
    }
}

impl Reporter for MismatchCollector {
    fn append(&mut self, mismatch: Mismatch) {
        self.mismatches.push(mismatch);
    }
}

impl Reporter for Vec<Mismatch> {
    fn append(&mut self, mismatch: Mismatch) {
        self.push(mismatch);
    }
}

/// Renders a list of mismatches into the final failure text.
pub struct Report<'a> {
    mismatches: &'a [Mismatch],
    subject_name: String,
    because: Option<String>,
    configuration: Option<&'a Configuration>,
}

impl<'a> Report<'a> {
    pub fn new(mismatches: &'a [Mismatch]) -> Self {
        Self {
            mismatches,
            subject_name: "subject".to_string(),
            because: None,
            configuration: None,
        }
    }

    pub fn subject_name(mut self, name: impl Into<String>) -> Self {
        self.subject_name = name.into();
        self
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if !reason.trim().is_empty() {
            self.because = Some(reason);
        }
        self
    }

    pub fn with_configuration(mut self, configuration: &'a Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected {} to be equivalent to the expectation", self.subject_name)?;
        if let Some(reason) = &self.because {
            write!(f, " because {reason}")?;
        }
        writeln!(f, ", but:")?;
        for mismatch in self.mismatches {
            writeln!(f, "- {}", mismatch.render(&self.subject_name))?;
        }
        if let Some(configuration) = self.configuration {
            writeln!(f)?;
            writeln!(f, "With configuration:")?;
            writeln!(f, "{configuration}")?;
        }
        Ok(())
    }
}
