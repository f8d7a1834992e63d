/// A catalog whose parent/clone structure cannot be turned into games.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("\"{clone}\" is a clone of \"{parent}\", which is not in the catalog")]
    DanglingParent { clone: String, parent: String },

    #[error("Clone chain starting at \"{name}\" loops back on itself")]
    Cycle { name: String },

    #[error("Duplicate entry name \"{0}\"")]
    DuplicateName(String),
}

impl CatalogError {
    pub fn dangling_parent(clone: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::DanglingParent {
            clone: clone.into(),
            parent: parent.into(),
        }
    }

    pub fn cycle(name: impl Into<String>) -> Self {
        Self::Cycle { name: name.into() }
    }
}
