use crate::config::Configuration;
use crate::members::TypeDescriptor;
use crate::path::Path;
use crate::reporter::{Mismatch, Reporter};
use crate::value::ObjectRef;
use std::fmt;
use std::sync::Arc;

/// Identity of an object pair under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitKey {
    subject: usize,
    expectation: usize,
    declared: usize,
}

impl VisitKey {
    pub fn new(
        subject: &ObjectRef,
        expectation: &ObjectRef,
        declared: Option<&Arc<TypeDescriptor>>,
    ) -> Self {
        Self {
            subject: subject.id(),
            expectation: expectation.id(),
            declared: declared.map_or(0, |ty| Arc::as_ptr(ty) as usize),
        }
    }
}

/// State of one comparison along the branch currently being walked.
///
/// Descending into a child extends the path, the depth and (for objects) the
/// visited stack; all of it is restored on return, so sibling branches never
/// observe each other.
///
/// A trial context carries a mismatch limit. Once that many mismatches have
/// been reported the context is exhausted and the engine stops descending.
pub struct Context<'c> {
    config: &'c Configuration,
    reporter: &'c mut dyn Reporter,
    path: Path,
    depth: usize,
    visited: Vec<VisitKey>,
    reported: usize,
    limit: Option<usize>,
}

impl<'c> Context<'c> {
    pub fn new(config: &'c Configuration, reporter: &'c mut dyn Reporter) -> Self {
        Self {
            config,
            reporter,
            path: Path::root(),
            depth: 0,
            visited: Vec::new(),
            reported: 0,
            limit: None,
        }
    }

    pub fn config(&self) -> &'c Configuration {
        self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_visited(&self, key: &VisitKey) -> bool {
        self.visited.contains(key)
    }

    pub fn is_trial(&self) -> bool {
        self.limit.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.reported >= limit)
    }

    /// Runs `f` one level down at `path`.
    pub fn descend<R>(&mut self, path: Path, f: impl FnOnce(&mut Self) -> R) -> R {
        let parent = std::mem::replace(&mut self.path, path);
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        self.path = parent;
        out
    }

    /// Runs `f` with `key` marked as being compared.
    pub fn visiting<R>(&mut self, key: VisitKey, f: impl FnOnce(&mut Self) -> R) -> R {
        self.visited.push(key);
        let out = f(self);
        self.visited.pop();
        out
    }

    /// A context for a trial comparison of a child at `path`, reporting into
    /// `reporter` instead of the real one and giving up after `limit`
    /// mismatches.
    pub fn trial<'p>(
        &self,
        path: Path,
        reporter: &'p mut dyn Reporter,
        limit: usize,
    ) -> Context<'p>
    where
        'c: 'p,
    {
        Context {
            config: self.config,
            reporter,
            path,
            depth: self.depth + 1,
            visited: self.visited.clone(),
            reported: 0,
            limit: Some(limit),
        }
    }

    pub fn report(
        &mut self,
        template: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) {
        let path = self.path.clone();
        self.report_at(path, template, expected, actual);
    }

    pub fn report_at(
        &mut self,
        path: Path,
        template: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) {
        self.reported += 1;
        self.reporter.append(Mismatch::new(path, template, expected, actual));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::members::TypeDescriptor;
    use crate::reporter::MismatchCollector;

    #[test]
    fn descending_restores_path_and_depth() {
        let config = Configuration::default();
        let mut collector = MismatchCollector::new();
        let mut ctx = Context::new(&config, &mut collector);
        let seen = ctx.descend(Path::root().append("A"), |ctx| {
            ctx.report("{0}", 1, 2);
            (ctx.path().to_string(), ctx.depth())
        });
        assert_eq!(seen, ("A".to_string(), 1));
        assert!(ctx.path().is_root());
        assert_eq!(ctx.depth(), 0);
        drop(ctx);
        assert_eq!(collector.mismatches()[0].path.to_string(), "A");
    }

    #[test]
    fn visited_pairs_are_branch_scoped() {
        let ty = TypeDescriptor::builder("Node").build();
        let (a, b) = (ObjectRef::new(&ty), ObjectRef::new(&ty));
        let key = VisitKey::new(&a, &b, None);
        let config = Configuration::default();
        let mut collector = MismatchCollector::new();
        let mut ctx = Context::new(&config, &mut collector);

        ctx.visiting(key, |ctx| {
            assert!(ctx.is_visited(&key));
            assert!(!ctx.is_visited(&VisitKey::new(&b, &a, None)));
            assert!(!ctx.is_visited(&VisitKey::new(&a, &b, Some(&ty))));
        });
        assert!(!ctx.is_visited(&key));
    }

    #[test]
    fn trial_contexts_stop_at_their_limit() {
        let config = Configuration::default();
        let mut collector = MismatchCollector::new();
        let ctx = Context::new(&config, &mut collector);
        assert!(!ctx.is_trial());

        let mut scratch = MismatchCollector::new();
        let mut trial = ctx.trial(Path::root().append_index(0), &mut scratch, 2);
        assert!(trial.is_trial());
        assert_eq!(trial.depth(), 1);
        trial.report("{0}", 1, 2);
        assert!(!trial.is_exhausted());
        trial.report("{0}", 1, 3);
        assert!(trial.is_exhausted());
        drop(trial);
        assert_eq!(scratch.len(), 2);
        assert_eq!(scratch.mismatches()[0].path.to_string(), "[0]");
    }
}
