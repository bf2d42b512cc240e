use std::fmt;
use std::sync::{Arc, OnceLock};

/// Accessibility of a field or of a property accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Internal,
    ProtectedInternal,
    Protected,
    PrivateProtected,
    Private,
}

impl Visibility {
    /// Internal and protected-internal members are reachable from the same assembly.
    pub fn is_internal(self) -> bool {
        matches!(self, Visibility::Internal | Visibility::ProtectedInternal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property {
        getter: Visibility,
        /// `None` for read-only properties.
        setter: Option<Visibility>,
    },
}

/// Describes one member of a type: how it is named, how it is reached and what
/// it was declared as.
#[derive(Debug, Clone)]
pub struct Member {
    name: String,
    kind: MemberKind,
    field_visibility: Visibility,
    declared: Option<Arc<TypeDescriptor>>,
}

impl Member {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            field_visibility: Visibility::Public,
            declared: None,
        }
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Property {
                getter: Visibility::Public,
                setter: Some(Visibility::Public),
            },
            field_visibility: Visibility::Public,
            declared: None,
        }
    }

    /// Sets the field visibility, or both accessors of a property.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        match &mut self.kind {
            MemberKind::Field => self.field_visibility = visibility,
            MemberKind::Property { getter, setter } => {
                *getter = visibility;
                if setter.is_some() {
                    *setter = Some(visibility);
                }
            }
        }
        self
    }

    pub fn getter(mut self, visibility: Visibility) -> Self {
        if let MemberKind::Property { getter, .. } = &mut self.kind {
            *getter = visibility;
        }
        self
    }

    pub fn setter(mut self, visibility: Visibility) -> Self {
        if let MemberKind::Property { setter, .. } = &mut self.kind {
            *setter = Some(visibility);
        }
        self
    }

    pub fn read_only(mut self) -> Self {
        if let MemberKind::Property { setter, .. } = &mut self.kind {
            *setter = None;
        }
        self
    }

    pub fn declared_as(mut self, ty: &Arc<TypeDescriptor>) -> Self {
        self.declared = Some(Arc::clone(ty));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_field(&self) -> bool {
        self.kind == MemberKind::Field
    }

    pub fn is_property(&self) -> bool {
        !self.is_field()
    }

    /// Field visibility, or the getter's visibility for properties.
    pub fn effective_visibility(&self) -> Visibility {
        match self.kind {
            MemberKind::Field => self.field_visibility,
            MemberKind::Property { getter, .. } => getter,
        }
    }

    pub fn getter_visibility(&self) -> Option<Visibility> {
        match self.kind {
            MemberKind::Field => None,
            MemberKind::Property { getter, .. } => Some(getter),
        }
    }

    pub fn setter_visibility(&self) -> Option<Visibility> {
        match self.kind {
            MemberKind::Field => None,
            MemberKind::Property { setter, .. } => setter,
        }
    }

    pub fn declared_type(&self) -> Option<&Arc<TypeDescriptor>> {
        self.declared.as_ref()
    }
}

/// Runtime type information for objects in the compared graphs.
pub struct TypeDescriptor {
    name: String,
    base: Option<Arc<TypeDescriptor>>,
    declared: Vec<Member>,
    resolved: OnceLock<Vec<Member>>,
}

impl TypeDescriptor {
    pub fn builder(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder {
            name: name.into(),
            base: None,
            declared: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&Arc<TypeDescriptor>> {
        self.base.as_ref()
    }

    /// Flat member list including inherited members.
    ///
    /// Resolved on first use and kept for the lifetime of the type. A member
    /// re-declared in a derived type replaces the inherited one in place, so an
    /// overridden member shows up exactly once.
    pub fn members(&self) -> &[Member] {
        self.resolved.get_or_init(|| {
            let mut flat = match &self.base {
                Some(base) => base.members().to_vec(),
                None => Vec::new(),
            };
            for member in &self.declared {
                match flat.iter_mut().find(|m| m.name == member.name) {
                    Some(slot) => *slot = member.clone(),
                    None => flat.push(member.clone()),
                }
            }
            flat
        })
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members().iter().find(|m| m.name == name)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name.clone()))
            .field("members", &self.declared.iter().map(|m| &m.name).collect::<Vec<_>>())
            .finish()
    }
}

pub struct TypeBuilder {
    name: String,
    base: Option<Arc<TypeDescriptor>>,
    declared: Vec<Member>,
}

impl TypeBuilder {
    pub fn base(mut self, base: &Arc<TypeDescriptor>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    pub fn field(self, name: impl Into<String>) -> Self {
        self.member(Member::field(name))
    }

    pub fn property(self, name: impl Into<String>) -> Self {
        self.member(Member::property(name))
    }

    pub fn member(mut self, member: Member) -> Self {
        match self.declared.iter_mut().find(|m| m.name == member.name) {
            Some(slot) => *slot = member,
            None => self.declared.push(member),
        }
        self
    }

    pub fn build(self) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor {
            name: self.name,
            base: self.base,
            declared: self.declared,
            resolved: OnceLock::new(),
        })
    }
}
