use std::sync::Arc;

pub fn collection(name: impl Into<String>) -> CollectionReference {
    CollectionReference::new(name)
}

/// A top-level collection path such as `predictions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReference(Arc<str>);

/// A document within a [`CollectionReference`], e.g. `predictions/abc123`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    parent: CollectionReference,
    id: Arc<str>,
}

impl CollectionReference {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self(Arc::from(collection_name.into()))
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentReference {
        DocumentReference {
            parent: self.clone(),
            id: Arc::from(id.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl DocumentReference {
    pub fn parent(&self) -> &CollectionReference {
        &self.parent
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for CollectionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.parent, self.id)
    }
}
