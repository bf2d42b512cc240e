//! Pluggable policies consulted by the traversal.

pub mod comparators;
pub mod matching;
pub mod ordering;
pub mod selection;

pub use comparators::{Registry, ValueComparator};
pub use matching::{MapMemberName, MatchByName, MatchingRule};
pub use ordering::OrderingRules;
pub use selection::{Candidate, MemberVisibility, SelectionRule};
