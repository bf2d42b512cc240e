use crate::path::Path;
use crate::pattern::PathPattern;
use std::fmt;

/// Whether sequence order matters, globally and per collection path.
///
/// Overrides are consulted newest first; the first one matching the path of
/// the collection decides. Without a matching override the global default
/// applies.
#[derive(Debug, Clone)]
pub struct OrderingRules {
    strict_by_default: bool,
    overrides: Vec<(PathPattern, bool)>,
}

impl Default for OrderingRules {
    fn default() -> Self {
        Self {
            strict_by_default: true,
            overrides: Vec::new(),
        }
    }
}

impl OrderingRules {
    pub fn set_default(&mut self, strict: bool) {
        self.strict_by_default = strict;
    }

    pub fn add_override(&mut self, pattern: PathPattern, strict: bool) {
        self.overrides.push((pattern, strict));
    }

    pub fn is_strict(&self, path: &Path) -> bool {
        self.overrides
            .iter()
            .rev()
            .find(|(pattern, _)| pattern.matches(path))
            .map_or(self.strict_by_default, |(_, strict)| *strict)
    }
}

impl fmt::Display for OrderingRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.strict_by_default {
            write!(f, "- Use strict ordering for collections")?;
        } else {
            write!(f, "- Ignore the order of collection items")?;
        }
        for (pattern, strict) in &self.overrides {
            if *strict {
                write!(f, "\n- Use strict ordering for {pattern}")?;
            } else {
                write!(f, "\n- Ignore the order of items in {pattern}")?;
            }
        }
        Ok(())
    }
}
