use crate::comparands::Comparands;
use crate::errors::{ConfigError, Result};
use crate::members::{Member, TypeDescriptor};
use crate::path::Path;
use crate::pattern::{PathPattern, PatternSegment, Selector};
use crate::rules::comparators::builtins::{ForType, When};
use crate::rules::selection::{ExcludeMember, ExcludeWhen, IncludeOnly, VisibleMembers};
use crate::rules::{
    Candidate, MapMemberName, MatchByName, MatchingRule, MemberVisibility, OrderingRules,
    Registry, SelectionRule, ValueComparator,
};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclicReferenceHandling {
    /// A pair already being compared on the current branch counts as equivalent.
    #[default]
    Ignore,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumEquivalency {
    #[default]
    ByValue,
    ByName,
}

/// Which type decides the members that get compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Typing {
    #[default]
    Declared,
    Runtime,
}

/// Immutable rule set for one or many comparisons.
///
/// Build it through [`Options`]. A configuration is `Send + Sync` and can be
/// shared between comparisons running on different threads.
pub struct Configuration {
    selection_rules: Vec<Box<dyn SelectionRule>>,
    matching_rules: Vec<Box<dyn MatchingRule>>,
    comparators: Registry,
    ordering: OrderingRules,
    cyclic_references: CyclicReferenceHandling,
    max_depth: Option<usize>,
    typing: Typing,
    enums: EnumEquivalency,
    excluding_missing_members: bool,
    failing_on_unexpected_members: bool,
    allowing_additional_keys: bool,
}

impl Configuration {
    pub fn builder() -> Options {
        Options::default()
    }

    /// AND over all selection rules; the first exclusion wins.
    pub fn includes(&self, candidate: &Candidate<'_>) -> bool {
        self.selection_rules.iter().all(|rule| rule.includes(candidate))
    }

    /// Custom matching rules first, then matching by name.
    pub fn find_match<'t>(
        &self,
        expectation_member: &Member,
        subject_type: &'t TypeDescriptor,
        parent: &Path,
    ) -> Option<&'t Member> {
        self.matching_rules
            .iter()
            .find_map(|rule| rule.find_match(expectation_member, subject_type, parent))
            .or_else(|| MatchByName.find_match(expectation_member, subject_type, parent))
    }

    pub fn find_comparator(
        &self,
        comparands: &Comparands<'_>,
        path: &Path,
    ) -> Option<Arc<dyn ValueComparator>> {
        self.comparators.find(comparands, path)
    }

    pub fn is_strict_ordering(&self, path: &Path) -> bool {
        self.ordering.is_strict(path)
    }

    pub fn cyclic_references(&self) -> CyclicReferenceHandling {
        self.cyclic_references
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn typing(&self) -> Typing {
        self.typing
    }

    pub fn enums(&self) -> EnumEquivalency {
        self.enums
    }

    pub fn excluding_missing_members(&self) -> bool {
        self.excluding_missing_members
    }

    pub fn failing_on_unexpected_members(&self) -> bool {
        self.failing_on_unexpected_members
    }

    pub fn allowing_additional_keys(&self) -> bool {
        self.allowing_additional_keys
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Options::default().assemble()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typing {
            Typing::Declared => writeln!(f, "- Use declared types and members")?,
            Typing::Runtime => writeln!(f, "- Use runtime types and members")?,
        }
        match self.enums {
            EnumEquivalency::ByValue => writeln!(f, "- Compare enums by value")?,
            EnumEquivalency::ByName => writeln!(f, "- Compare enums by name")?,
        }
        for rule in &self.selection_rules {
            writeln!(f, "- {rule}")?;
        }
        for rule in &self.matching_rules {
            writeln!(f, "- {rule}")?;
        }
        writeln!(f, "- {MatchByName}")?;
        if self.excluding_missing_members {
            writeln!(f, "- Ignore members missing from the subject")?;
        }
        if self.failing_on_unexpected_members {
            writeln!(f, "- Fail on members the expectation does not have")?;
        }
        if self.allowing_additional_keys {
            writeln!(f, "- Allow additional dictionary keys")?;
        }
        writeln!(f, "{}", self.ordering)?;
        for line in self.comparators.describe() {
            writeln!(f, "{line}")?;
        }
        match self.cyclic_references {
            CyclicReferenceHandling::Ignore => writeln!(f, "- Ignore cyclic references")?,
            CyclicReferenceHandling::Report => writeln!(f, "- Report cyclic references")?,
        }
        match self.max_depth {
            Some(depth) => write!(f, "- Limit recursion to {depth} levels"),
            None => write!(f, "- Allow infinite recursion"),
        }
    }
}

/// Builder for a [`Configuration`].
///
/// Selector errors are recorded as they happen and returned by [`Options::build`],
/// so a bad selector fails the comparison before any traversal starts.
pub struct Options {
    visibility: MemberVisibility,
    inclusions: Vec<PathPattern>,
    exclusions: Vec<Box<dyn SelectionRule>>,
    mappings: Vec<Box<dyn MatchingRule>>,
    comparators: Registry,
    ordering: OrderingRules,
    cyclic_references: CyclicReferenceHandling,
    max_depth: Option<usize>,
    typing: Typing,
    enums: EnumEquivalency,
    excluding_missing_members: bool,
    failing_on_unexpected_members: bool,
    allowing_additional_keys: bool,
    error: Option<ConfigError>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            visibility: MemberVisibility::default(),
            inclusions: Vec::new(),
            exclusions: Vec::new(),
            mappings: Vec::new(),
            comparators: Registry::new(),
            ordering: OrderingRules::default(),
            cyclic_references: CyclicReferenceHandling::default(),
            max_depth: Some(DEFAULT_MAX_RECURSION_DEPTH),
            typing: Typing::default(),
            enums: EnumEquivalency::default(),
            excluding_missing_members: false,
            failing_on_unexpected_members: false,
            allowing_additional_keys: false,
            error: None,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, error: ConfigError) {
        self.error.get_or_insert(error);
    }

    fn resolve(&mut self, selector: impl Selector) -> Option<PathPattern> {
        match selector.into_pattern() {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Leaves the selected member (and everything below it) out of the comparison.
    pub fn excluding(mut self, selector: impl Selector) -> Self {
        if let Some(pattern) = self.resolve(selector) {
            self.exclusions.push(Box::new(ExcludeMember(pattern)));
        }
        self
    }

    /// Leaves out every member for which `predicate` holds.
    pub fn excluding_when<F>(mut self, description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Candidate<'_>) -> bool + Send + Sync + 'static,
    {
        self.exclusions.push(Box::new(ExcludeWhen {
            description: description.into(),
            predicate: Box::new(predicate),
        }));
        self
    }

    /// Restricts the comparison to the selected members. Can be repeated.
    pub fn including(mut self, selector: impl Selector) -> Self {
        if let Some(pattern) = self.resolve(selector) {
            self.inclusions.push(pattern);
        }
        self
    }

    pub fn excluding_fields(mut self) -> Self {
        self.visibility.fields = false;
        self
    }

    pub fn excluding_properties(mut self) -> Self {
        self.visibility.properties = false;
        self
    }

    pub fn including_fields(mut self) -> Self {
        self.visibility.fields = true;
        self
    }

    pub fn including_properties(mut self) -> Self {
        self.visibility.properties = true;
        self
    }

    pub fn including_internal_fields(mut self) -> Self {
        self.visibility.internal_fields = true;
        self
    }

    pub fn including_internal_properties(mut self) -> Self {
        self.visibility.internal_properties = true;
        self
    }

    /// Expectation members the subject does not have are skipped instead of failing.
    pub fn excluding_missing_members(mut self) -> Self {
        self.excluding_missing_members = true;
        self
    }

    /// Subject members the expectation does not have fail the comparison.
    pub fn failing_on_unexpected_members(mut self) -> Self {
        self.failing_on_unexpected_members = true;
        self
    }

    /// Subject dictionaries may contain keys the expectation does not have.
    pub fn allowing_additional_keys(mut self) -> Self {
        self.allowing_additional_keys = true;
        self
    }

    pub fn with_strict_ordering(mut self) -> Self {
        self.ordering.set_default(true);
        self
    }

    pub fn without_strict_ordering(mut self) -> Self {
        self.ordering.set_default(false);
        self
    }

    pub fn with_strict_ordering_for(mut self, selector: impl Selector) -> Self {
        if let Some(pattern) = self.resolve(selector) {
            self.ordering.add_override(pattern, true);
        }
        self
    }

    pub fn without_strict_ordering_for(mut self, selector: impl Selector) -> Self {
        if let Some(pattern) = self.resolve(selector) {
            self.ordering.add_override(pattern, false);
        }
        self
    }

    /// Compares all values whose runtime type is `type_name` with `equality`.
    pub fn using_for_type<F>(mut self, type_name: &str, equality: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.comparators.register_for_type(
            type_name,
            ForType {
                type_name: type_name.to_string(),
                equality: Box::new(equality),
            },
        );
        self
    }

    /// Compares every node accepted by `condition` with `equality`.
    pub fn using_when<C, F>(
        mut self,
        description: impl Into<String>,
        condition: C,
        equality: F,
    ) -> Self
    where
        C: Fn(&Comparands<'_>, &Path) -> bool + Send + Sync + 'static,
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.comparators.register(When {
            description: description.into(),
            condition: Box::new(condition),
            equality: Box::new(equality),
        });
        self
    }

    pub fn using<C: ValueComparator + 'static>(mut self, comparator: C) -> Self {
        self.comparators.register(comparator);
        self
    }

    /// Pairs the expectation member `expectation` with the subject member
    /// `subject`. Both may be qualified with the same parent, e.g.
    /// `("Owner.Name", "Owner.FullName")`.
    pub fn with_mapping(mut self, expectation: &str, subject: &str) -> Self {
        match mapping(expectation, subject) {
            Ok(rule) => self.mappings.push(Box::new(rule)),
            Err(e) => self.fail(e),
        }
        self
    }

    pub fn matching_with<R: MatchingRule + 'static>(mut self, rule: R) -> Self {
        self.mappings.push(Box::new(rule));
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        if depth == 0 {
            self.fail(ConfigError::InvalidDepth(depth));
        } else {
            self.max_depth = Some(depth);
        }
        self
    }

    pub fn allowing_infinite_recursion(mut self) -> Self {
        self.max_depth = None;
        self
    }

    pub fn ignoring_cyclic_references(mut self) -> Self {
        self.cyclic_references = CyclicReferenceHandling::Ignore;
        self
    }

    pub fn reporting_cyclic_references(mut self) -> Self {
        self.cyclic_references = CyclicReferenceHandling::Report;
        self
    }

    pub fn respecting_runtime_types(mut self) -> Self {
        self.typing = Typing::Runtime;
        self
    }

    pub fn respecting_declared_types(mut self) -> Self {
        self.typing = Typing::Declared;
        self
    }

    pub fn comparing_enums_by_name(mut self) -> Self {
        self.enums = EnumEquivalency::ByName;
        self
    }

    pub fn comparing_enums_by_value(mut self) -> Self {
        self.enums = EnumEquivalency::ByValue;
        self
    }

    pub fn build(mut self) -> Result<Configuration> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(self.assemble()),
        }
    }

    fn assemble(self) -> Configuration {
        let mut selection_rules: Vec<Box<dyn SelectionRule>> =
            vec![Box::new(VisibleMembers(self.visibility))];
        if !self.inclusions.is_empty() {
            selection_rules.push(Box::new(IncludeOnly(self.inclusions)));
        }
        selection_rules.extend(self.exclusions);
        Configuration {
            selection_rules,
            matching_rules: self.mappings,
            comparators: self.comparators,
            ordering: self.ordering,
            cyclic_references: self.cyclic_references,
            max_depth: self.max_depth,
            typing: self.typing,
            enums: self.enums,
            excluding_missing_members: self.excluding_missing_members,
            failing_on_unexpected_members: self.failing_on_unexpected_members,
            allowing_additional_keys: self.allowing_additional_keys,
        }
    }
}

fn mapping(expectation: &str, subject: &str) -> Result<MapMemberName> {
    let (expected_parent, expected_name) = split_member(expectation)?;
    let (subject_parent, subject_name) = split_member(subject)?;
    if subject_parent.is_some() && subject_parent != expected_parent {
        return Err(ConfigError::UnsupportedSelector {
            expression: subject.to_string(),
            reason: format!(
                "a member can only be mapped to a member of the same parent as {expectation}"
            ),
        });
    }
    Ok(MapMemberName {
        parent: expected_parent,
        expectation: expected_name,
        subject: subject_name,
    })
}

fn split_member(expression: &str) -> Result<(Option<PathPattern>, String)> {
    let pattern = PathPattern::parse(expression)?;
    let segments = pattern.segments();
    let Some((PatternSegment::Member(name), parent)) = segments.split_last() else {
        return Err(ConfigError::UnsupportedSelector {
            expression: expression.to_string(),
            reason: "a mapping must end in a member name".into(),
        });
    };
    let parent = parent
        .iter()
        .cloned()
        .fold(None, |acc: Option<PathPattern>, seg| {
            let p = acc.unwrap_or_default();
            Some(match seg {
                PatternSegment::Member(m) => p.member(m),
                PatternSegment::Index(i) => p.index(i),
                PatternSegment::AnyIndex => p.any_index(),
                PatternSegment::Key(k) => p.key(k),
            })
        });
    Ok((parent, name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn configuration_is_shareable_across_threads() {
        assert_send_sync::<Configuration>();
    }

    #[test]
    fn first_selector_error_is_returned_by_build() {
        let err = Options::new()
            .excluding("Name")
            .excluding("Age * 2")
            .excluding("")
            .build()
            .err();
        assert_eq!(
            err,
            Some(ConfigError::UnsupportedSelector {
                expression: "Age * 2".into(),
                reason: "unexpected '*'".into(),
            })
        );
        assert_eq!(
            Options::new().with_max_recursion_depth(0).build().err(),
            Some(ConfigError::InvalidDepth(0))
        );
    }

    #[test]
    fn exclusions_and_inclusions_combine_with_and() {
        let config = Options::new()
            .including("Level")
            .excluding("Level.Text")
            .build()
            .unwrap();
        let level = Path::root().append("Level");
        let text = level.append("Text");
        let name = Path::root().append("Name");
        let included = |path: &Path| config.includes(&Candidate { path, member: None });
        assert!(included(&level));
        assert!(!included(&text));
        assert!(!included(&name));
    }

    #[test]
    fn mappings_are_scoped_to_their_parent() {
        let rule = mapping("Owner.Name", "Owner.FullName").unwrap();
        assert_eq!(rule.parent, Some(PathPattern::parse("Owner").unwrap()));
        assert_eq!(rule.expectation, "Name");
        assert_eq!(rule.subject, "FullName");
        assert!(mapping("Owner.Name", "Other.FullName").is_err());
        assert!(mapping("Items[1]", "Other").is_err());
        assert!(mapping("Name", "FullName").unwrap().parent.is_none());
    }

    #[test]
    fn describes_itself() {
        let config = Options::new()
            .excluding("Age")
            .excluding_when("path is Age", |c| c.path() == "Age")
            .without_strict_ordering()
            .build()
            .unwrap();
        let text = config.to_string();
        assert!(text.contains("- Exclude member Age\n"));
        assert!(text.contains("- Exclude member when path is Age\n"));
        assert!(text.contains("- Include public fields and public properties\n"));
        assert!(text.contains("- Ignore the order of collection items\n"));
        assert!(text.ends_with("- Limit recursion to 10 levels"));
    }
}
