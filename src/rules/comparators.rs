use crate::comparands::Comparands;
use crate::path::Path;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Replaces structural recursion with a custom equality check.
pub trait ValueComparator: Send + Sync {
    fn name(&self) -> &str;
    /// Whether this comparator takes over the given node.
    fn handles(&self, comparands: &Comparands<'_>, path: &Path) -> bool;
    fn equivalent(&self, subject: &Value, expectation: &Value) -> bool;
}

/// Thread-safe comparator registry.
///
/// Conditional comparators are tried in registration order before the ones
/// keyed by the runtime type name of the expectation.
#[derive(Clone, Default)]
pub struct Registry {
    by_type: Arc<HashMap<String, Arc<dyn ValueComparator>>>,
    conditional: Arc<Vec<Arc<dyn ValueComparator>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_for_type<C: ValueComparator + 'static>(&mut self, type_name: &str, c: C) {
        let map = Arc::make_mut(&mut self.by_type);
        map.insert(type_name.to_string(), Arc::new(c));
    }

    pub fn register<C: ValueComparator + 'static>(&mut self, c: C) {
        Arc::make_mut(&mut self.conditional).push(Arc::new(c));
    }

    /// Conditional comparators first, then the one registered for the runtime
    /// type of the expectation, then the one for its declared type.
    pub fn find(
        &self,
        comparands: &Comparands<'_>,
        path: &Path,
    ) -> Option<Arc<dyn ValueComparator>> {
        if let Some(c) = self.conditional.iter().find(|c| c.handles(comparands, path)) {
            return Some(Arc::clone(c));
        }
        if comparands.expectation.is_null() {
            return None;
        }
        let runtime = comparands.expectation_type();
        let declared = comparands.declared.map(|ty| ty.name());
        let found = [Some(runtime.as_str()), declared]
            .into_iter()
            .flatten()
            .filter_map(|name| self.by_type.get(name))
            .find(|c| c.handles(comparands, path))
            .cloned();
        found
    }

    pub fn describe(&self) -> Vec<String> {
        let mut types: Vec<_> = self.by_type.iter().collect();
        types.sort_by(|a, b| a.0.cmp(b.0));
        types
            .into_iter()
            .map(|(ty, c)| format!("- Compare {ty} using {}", c.name()))
            .chain(
                self.conditional
                    .iter()
                    .map(|c| format!("- Compare using {}", c.name())),
            )
            .collect()
    }
}

pub mod builtins {
    use super::*;

    pub type Equality = dyn Fn(&Value, &Value) -> bool + Send + Sync;
    pub type Condition = dyn Fn(&Comparands<'_>, &Path) -> bool + Send + Sync;

    /// Compares every value of one type with a closure. The type is matched
    /// against the runtime type of the expectation or the declared type of its
    /// slot.
    pub struct ForType {
        pub type_name: String,
        pub equality: Box<Equality>,
    }

    impl ValueComparator for ForType {
        fn name(&self) -> &str {
            "a custom equality check"
        }
        fn handles(&self, comparands: &Comparands<'_>, _path: &Path) -> bool {
            comparands.expectation_type() == self.type_name
                || comparands.declared.is_some_and(|ty| ty.name() == self.type_name)
        }
        fn equivalent(&self, subject: &Value, expectation: &Value) -> bool {
            (self.equality)(subject, expectation)
        }
    }

    /// Compares every node accepted by a condition with a closure.
    pub struct When {
        pub description: String,
        pub condition: Box<Condition>,
        pub equality: Box<Equality>,
    }

    impl ValueComparator for When {
        fn name(&self) -> &str {
            &self.description
        }
        fn handles(&self, comparands: &Comparands<'_>, path: &Path) -> bool {
            (self.condition)(comparands, path)
        }
        fn equivalent(&self, subject: &Value, expectation: &Value) -> bool {
            (self.equality)(subject, expectation)
        }
    }
}
