//! Ordered selection of user ids.

/// An immutable, insertion-ordered set of user ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Build a selection by including each id in turn. Duplicates collapse.
    #[must_use]
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .fold(Self::new(), |acc, id| acc.with(id.as_ref(), true))
    }

    /// Return a new selection with `id` included or removed.
    ///
    /// Including an id already present keeps its original position.
    #[must_use]
    pub fn with(&self, id: &str, included: bool) -> Self {
        let present = self.contains(id);
        match (included, present) {
            (true, false) => {
                let mut ids = self.ids.clone();
                ids.push(id.to_string());
                Self { ids }
            }
            (false, true) => Self {
                ids: self.ids.iter().filter(|i| *i != id).cloned().collect(),
            },
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }
}
