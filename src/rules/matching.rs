use crate::members::{Member, TypeDescriptor};
use crate::path::Path;
use crate::pattern::PathPattern;
use std::fmt;

/// Finds the subject member that corresponds to a member of the expectation.
///
/// `parent` is the path of the object that owns both members.
pub trait MatchingRule: Send + Sync + fmt::Display {
    fn find_match<'t>(
        &self,
        expectation_member: &Member,
        subject_type: &'t TypeDescriptor,
        parent: &Path,
    ) -> Option<&'t Member>;
}

/// Pairs members with identical, case-sensitive names.
pub struct MatchByName;

impl MatchingRule for MatchByName {
    fn find_match<'t>(
        &self,
        expectation_member: &Member,
        subject_type: &'t TypeDescriptor,
        _parent: &Path,
    ) -> Option<&'t Member> {
        subject_type.member(expectation_member.name())
    }
}

impl fmt::Display for MatchByName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match member by name")
    }
}

/// Maps an expectation member onto a differently named subject member,
/// optionally only below a given parent.
pub struct MapMemberName {
    pub parent: Option<PathPattern>,
    pub expectation: String,
    pub subject: String,
}

impl MatchingRule for MapMemberName {
    fn find_match<'t>(
        &self,
        expectation_member: &Member,
        subject_type: &'t TypeDescriptor,
        parent: &Path,
    ) -> Option<&'t Member> {
        if expectation_member.name() != self.expectation {
            return None;
        }
        let in_scope = match &self.parent {
            Some(pattern) => pattern.matches(parent),
            None => true,
        };
        if !in_scope {
            return None;
        }
        subject_type.member(&self.subject)
    }
}

impl fmt::Display for MapMemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(
                f,
                "Map {parent}.{} to {parent}.{}",
                self.expectation, self.subject
            ),
            None => write!(f, "Map member {} to {}", self.expectation, self.subject),
        }
    }
}
