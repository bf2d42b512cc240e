use crate::members::{Member, MemberKind, Visibility};
use crate::path::Path;
use crate::pattern::{PathPattern, Relation};
use itertools::Itertools;
use std::fmt;

/// A node that may take part in the comparison: an object member, or a
/// dictionary entry when `member` is `None`.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub path: &'a Path,
    pub member: Option<&'a Member>,
}

impl<'a> Candidate<'a> {
    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.member.map(Member::name)
    }

    pub fn is_field(&self) -> bool {
        self.member.is_some_and(Member::is_field)
    }

    pub fn is_property(&self) -> bool {
        self.member.is_some_and(Member::is_property)
    }

    pub fn which_getter_has(&self, visibility: Visibility) -> bool {
        self.member
            .and_then(Member::getter_visibility)
            .is_some_and(|v| v == visibility)
    }

    pub fn which_setter_has(&self, visibility: Visibility) -> bool {
        self.member
            .and_then(Member::setter_visibility)
            .is_some_and(|v| v == visibility)
    }
}

/// Decides whether a candidate participates in the comparison.
///
/// All registered rules must include a candidate for it to be compared; the
/// first rule that rejects it wins.
pub trait SelectionRule: Send + Sync + fmt::Display {
    fn includes(&self, candidate: &Candidate<'_>) -> bool;
}

/// Which members the default rule considers visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberVisibility {
    pub fields: bool,
    pub properties: bool,
    pub internal_fields: bool,
    pub internal_properties: bool,
}

impl Default for MemberVisibility {
    fn default() -> Self {
        Self {
            fields: true,
            properties: true,
            internal_fields: false,
            internal_properties: false,
        }
    }
}

/// Includes public fields and properties, plus internal ones when asked to.
pub struct VisibleMembers(pub MemberVisibility);

impl SelectionRule for VisibleMembers {
    fn includes(&self, candidate: &Candidate<'_>) -> bool {
        let Some(member) = candidate.member else {
            return true;
        };
        let (enabled, internal_allowed) = match member.kind() {
            MemberKind::Field => (self.0.fields, self.0.internal_fields),
            MemberKind::Property { .. } => (self.0.properties, self.0.internal_properties),
        };
        let visibility = member.effective_visibility();
        enabled
            && (visibility == Visibility::Public
                || (internal_allowed && visibility.is_internal()))
    }
}

impl fmt::Display for VisibleMembers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |kind: &str, internal: bool| {
            if internal {
                format!("public and internal {kind}")
            } else {
                format!("public {kind}")
            }
        };
        let mut parts = Vec::new();
        if self.0.fields {
            parts.push(describe("fields", self.0.internal_fields));
        }
        if self.0.properties {
            parts.push(describe("properties", self.0.internal_properties));
        }
        if parts.is_empty() {
            write!(f, "Include no fields or properties")
        } else {
            write!(f, "Include {}", parts.join(" and "))
        }
    }
}

/// Excludes the selected member and everything below it.
pub struct ExcludeMember(pub PathPattern);

impl SelectionRule for ExcludeMember {
    fn includes(&self, candidate: &Candidate<'_>) -> bool {
        !self.0.covers(candidate.path)
    }
}

impl fmt::Display for ExcludeMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exclude member {}", self.0)
    }
}

pub type CandidatePredicate = dyn Fn(&Candidate<'_>) -> bool + Send + Sync;

pub struct ExcludeWhen {
    pub description: String,
    pub predicate: Box<CandidatePredicate>,
}

impl SelectionRule for ExcludeWhen {
    fn includes(&self, candidate: &Candidate<'_>) -> bool {
        !(self.predicate)(candidate)
    }
}

impl fmt::Display for ExcludeWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exclude member when {}", self.description)
    }
}

/// Restricts the comparison to the listed members. Ancestors of a listed
/// member stay included so the traversal can reach it.
pub struct IncludeOnly(pub Vec<PathPattern>);

impl SelectionRule for IncludeOnly {
    fn includes(&self, candidate: &Candidate<'_>) -> bool {
        self.0
            .iter()
            .any(|p| p.relation(candidate.path) != Relation::Unrelated)
    }
}

impl fmt::Display for IncludeOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Include only member(s) {}", self.0.iter().join(", "))
    }
}
