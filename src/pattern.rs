use crate::errors::{ConfigError, Result};
use crate::parser::{ParseError, Parser};
use crate::path::{Path, Segment};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Member(String), // .Name
    Index(usize),   // [1]
    AnyIndex,       // [*] or []
    Key(String),    // ["Bar"] or [Bar]
}

/// How an actual path relates to a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Unrelated,
    /// The path is an ancestor of the selected member.
    Ancestor,
    Exact,
    /// The path lies below the selected member.
    Descendant,
}

/// A member selector resolved to a canonical sequence of steps.
///
/// Built either from text (`"Level.Level.Text"`, `"List[1].Foo"`,
/// `"Dictionary[\"Bar\"].Value"`) or step by step. Leading collection indices of
/// an actual path are ignored while matching, so `Name` also selects `[0].Name`
/// when the root of the comparison is a collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PatternSegment::Member(name.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PatternSegment::Index(index));
        self
    }

    pub fn any_index(mut self) -> Self {
        self.segments.push(PatternSegment::AnyIndex);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PatternSegment::Key(key.into()));
        self
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        parse_segments(trimmed)
            .map(|segments| PathPattern { segments })
            .map_err(|ParseError::InvalidSyntax(reason)| ConfigError::UnsupportedSelector {
                expression: expression.to_string(),
                reason,
            })
    }

    fn validate(self) -> Result<Self> {
        if self.segments.is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        for segment in &self.segments {
            if let PatternSegment::Member(name) = segment {
                let valid = name.chars().all(|c| c == '_' || c.is_alphanumeric())
                    && !name.is_empty()
                    && !name.starts_with(|c: char| c.is_ascii_digit());
                if !valid {
                    return Err(ConfigError::UnsupportedSelector {
                        expression: self.to_string(),
                        reason: format!("'{name}' is not a member name"),
                    });
                }
            }
        }
        Ok(self)
    }

    pub fn relation(&self, path: &Path) -> Relation {
        let mut actual = path.segments();
        let anchored = matches!(
            self.segments.first(),
            Some(PatternSegment::Index(_)) | Some(PatternSegment::AnyIndex)
        );
        if !anchored {
            let leading = actual
                .iter()
                .take_while(|s| matches!(s, Segment::Index(_)))
                .count();
            actual.drain(..leading);
        }
        let all_match = self
            .segments
            .iter()
            .zip(actual.iter())
            .all(|(p, s)| segment_matches(p, s));
        if !all_match {
            return Relation::Unrelated;
        }
        match actual.len().cmp(&self.segments.len()) {
            std::cmp::Ordering::Less => Relation::Ancestor,
            std::cmp::Ordering::Equal => Relation::Exact,
            std::cmp::Ordering::Greater => Relation::Descendant,
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.relation(path) == Relation::Exact
    }

    /// True for the selected member and everything below it.
    pub fn covers(&self, path: &Path) -> bool {
        matches!(self.relation(path), Relation::Exact | Relation::Descendant)
    }
}

fn segment_matches(pattern: &PatternSegment, actual: &Segment) -> bool {
    match (pattern, actual) {
        (PatternSegment::Member(p), Segment::Member(a)) => p == a,
        (PatternSegment::Member(p), Segment::Key(a)) => p == a,
        (PatternSegment::Key(p), Segment::Key(a)) => p == a,
        (PatternSegment::Key(p), Segment::Member(a)) => p == a,
        (PatternSegment::Index(p), Segment::Index(a)) => p == a,
        (PatternSegment::Index(p), Segment::Key(a)) => p.to_string() == *a,
        (PatternSegment::AnyIndex, Segment::Index(_) | Segment::Key(_)) => true,
        _ => false,
    }
}

fn parse_segments(input: &str) -> std::result::Result<Vec<PatternSegment>, ParseError> {
    let mut p = Parser::new(input);
    let mut segments = Vec::new();
    if p.peek_char() != Some('[') {
        segments.push(PatternSegment::Member(p.parse_identifier()?));
    }
    loop {
        p.skip_ws();
        if p.eof() {
            break;
        }
        if p.consume_char('.') {
            p.skip_ws();
            segments.push(PatternSegment::Member(p.parse_identifier()?));
            continue;
        }
        if p.consume_char('[') {
            p.skip_ws();
            segments.push(parse_bracket(&mut p)?);
            continue;
        }
        return Err(match p.peek_char() {
            Some(c) => ParseError::InvalidSyntax(format!("unexpected '{c}'")),
            None => ParseError::InvalidSyntax("unexpected end of expression".into()),
        });
    }
    Ok(segments)
}

fn parse_bracket(p: &mut Parser) -> std::result::Result<PatternSegment, ParseError> {
    if p.consume_char(']') {
        return Ok(PatternSegment::AnyIndex);
    }
    if p.consume_char('*') {
        p.skip_ws();
        p.expect(']')?;
        return Ok(PatternSegment::AnyIndex);
    }
    if p.peek_char() == Some('"') || p.peek_char() == Some('\'') {
        let key = p.parse_quoted_string()?;
        p.skip_ws();
        p.expect(']')?;
        return Ok(PatternSegment::Key(key));
    }
    if p.peek_char().is_some_and(|c| c.is_ascii_digit()) {
        let index = p.parse_index()?;
        p.skip_ws();
        p.expect(']')?;
        return Ok(PatternSegment::Index(index));
    }
    let content = p.capture_until(']')?.trim();
    p.expect(']')?;
    if content.contains(['[', '"', '\'']) {
        return Err(ParseError::InvalidSyntax(format!("bad key '{content}'")));
    }
    Ok(PatternSegment::Key(content.to_string()))
}

impl FromStr for PathPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        PathPattern::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PatternSegment::Member(name) if i == 0 => write!(f, "{name}")?,
                PatternSegment::Member(name) => write!(f, ".{name}")?,
                PatternSegment::Index(index) => write!(f, "[{index}]")?,
                PatternSegment::AnyIndex => write!(f, "[*]")?,
                PatternSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

/// Anything that resolves to a member selection at configuration time.
pub trait Selector {
    fn into_pattern(self) -> Result<PathPattern>;
}

impl Selector for &str {
    fn into_pattern(self) -> Result<PathPattern> {
        PathPattern::parse(self)
    }
}

impl Selector for String {
    fn into_pattern(self) -> Result<PathPattern> {
        PathPattern::parse(&self)
    }
}

impl Selector for &String {
    fn into_pattern(self) -> Result<PathPattern> {
        PathPattern::parse(self)
    }
}

impl Selector for PathPattern {
    fn into_pattern(self) -> Result<PathPattern> {
        self.validate()
    }
}
