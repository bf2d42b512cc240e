use crate::members::TypeDescriptor;
use crate::value::Value;
use std::sync::Arc;

/// The pair of values compared at one traversal step, together with the type
/// the expectation slot was declared as.
///
/// `declared` is `None` when nothing is known statically about the slot (the
/// root of a comparison, sequence elements, dictionary values, untyped members);
/// the runtime type of the expectation is used then.
#[derive(Debug, Clone, Copy)]
pub struct Comparands<'v> {
    pub subject: &'v Value,
    pub expectation: &'v Value,
    pub declared: Option<&'v Arc<TypeDescriptor>>,
}

impl<'v> Comparands<'v> {
    pub fn new(subject: &'v Value, expectation: &'v Value) -> Self {
        Self {
            subject,
            expectation,
            declared: None,
        }
    }

    pub fn declared_as(mut self, declared: Option<&'v Arc<TypeDescriptor>>) -> Self {
        self.declared = declared;
        self
    }

    /// Runtime type name of the expectation, which keys comparator overrides.
    pub fn expectation_type(&self) -> String {
        self.expectation.type_name()
    }
}
