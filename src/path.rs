use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Member(String), // .Name
    Index(usize),   // [2]
    Key(String),    // [Bar]
}

/// Location of a node inside the compared graphs.
///
/// A path is an immutable chain of segments. Appending shares the parent, so
/// every child path is a cheap extension of its parent and the parent itself is
/// never changed.
#[derive(Clone, Default)]
pub struct Path {
    tail: Option<Arc<Link>>,
    len: usize,
}

struct Link {
    parent: Path,
    segment: Segment,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    pub fn append(&self, member: impl Into<String>) -> Path {
        self.push(Segment::Member(member.into()))
    }

    pub fn append_index(&self, index: usize) -> Path {
        self.push(Segment::Index(index))
    }

    pub fn append_key(&self, key: impl Into<String>) -> Path {
        self.push(Segment::Key(key.into()))
    }

    pub fn push(&self, segment: Segment) -> Path {
        Path {
            tail: Some(Arc::new(Link {
                parent: self.clone(),
                segment,
            })),
            len: self.len + 1,
        }
    }

    /// Segments from the root down to this node.
    pub fn segments(&self) -> Vec<&Segment> {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = &self.tail;
        while let Some(link) = cur {
            out.push(&link.segment);
            cur = &link.parent.tail;
        }
        out.reverse();
        out
    }

    /// True when `prefix` names this node or one of its ancestors.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        if prefix.len > self.len {
            return false;
        }
        let mut cur = self;
        while cur.len > prefix.len {
            match &cur.tail {
                Some(link) => cur = &link.parent,
                None => return false,
            }
        }
        cur == prefix
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        let (mut a, mut b) = (&self.tail, &other.tail);
        while let (Some(la), Some(lb)) = (a, b) {
            if Arc::ptr_eq(la, lb) {
                return true;
            }
            if la.segment != lb.segment {
                return false;
            }
            a = &la.parent.tail;
            b = &lb.parent.tail;
        }
        true
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for segment in self.segments() {
            segment.hash(state);
        }
    }
}

impl PartialEq<str> for Path {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Path {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().into_iter().enumerate() {
            match segment {
                Segment::Member(name) if i == 0 => write!(f, "{name}")?,
                Segment::Member(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
