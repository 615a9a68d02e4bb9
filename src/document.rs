use log::{debug, trace};

use crate::error::DocumentError;

/// An in-memory configuration document made of named sections.
///
/// Sections and entries are kept in creation order internally and enumerated newest-first, so
/// position `0` is always the most recently created item. Nothing is ever removed, which keeps
/// the cursor index valid for the lifetime of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    sections: Vec<Section>,
    /// Index into `sections` of the section receiving new entries.
    cursor: Option<usize>,
}

impl Document {
    /// Create an empty document.
    ///
    /// # Panics
    ///
    /// Aborts like any other allocation if `name` cannot be copied. Use [`Document::try_new`] to
    /// observe allocation failure instead.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
            cursor: None,
        }
    }

    /// Create an empty document, reporting allocation failure as an error.
    pub fn try_new(name: &str) -> Result<Self, DocumentError> {
        Ok(Self {
            name: try_to_owned(name)?,
            sections: Vec::new(),
            cursor: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Select the section called `name`, creating it first if it does not exist.
    ///
    /// Existing sections keep their position. A new section becomes position `0`. Either way the
    /// section becomes the target of [`Document::insert_entry`].
    pub fn select_section(&mut self, name: &str) -> Result<&mut Self, DocumentError> {
        let index = if let Some(i) = self.find_section(name) {
            trace!("{}: selected existing section [{name}]", self.name);
            i
        } else {
            // Reserve everything up front so a failure never leaves a half-built section behind.
            let owned = try_to_owned(name)?;
            self.sections
                .try_reserve(1)
                .map_err(|_| DocumentError::Allocation)?;
            self.sections.push(Section::new(owned));
            debug!("{}: created section [{name}]", self.name);
            self.sections.len() - 1
        };

        self.cursor = Some(index);
        Ok(self)
    }

    /// Add `key = value` to the currently selected section.
    ///
    /// If the key already exists the original value is kept and the call still succeeds.
    pub fn insert_entry(&mut self, key: &str, value: &str) -> Result<&mut Self, DocumentError> {
        let section = self
            .cursor
            .and_then(|i| self.sections.get_mut(i))
            .ok_or(DocumentError::NoActiveSection)?;

        if section.get(key).is_some() {
            trace!("[{}]: ignoring duplicate key {key:?}", section.name);
            return Ok(self);
        }

        let entry = Entry::try_new(key, value)?;
        section
            .entries
            .try_reserve(1)
            .map_err(|_| DocumentError::Allocation)?;
        section.entries.push(entry);

        Ok(self)
    }

    /// The section currently receiving entries, if one has been selected.
    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.cursor.and_then(|i| self.sections.get(i))
    }

    /// Sections from newest to oldest.
    pub fn sections(&self) -> impl DoubleEndedIterator<Item = &Section> + ExactSizeIterator {
        self.sections.iter().rev()
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.find_section(name).map(|i| &self.sections[i])
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Number of keys in the named section. A missing section counts as empty; use
    /// [`Document::section`] to tell the two apart.
    #[must_use]
    pub fn key_count(&self, section: &str) -> usize {
        self.section(section).map_or(0, Section::len)
    }

    #[must_use]
    pub fn section_name_at(&self, position: usize) -> Option<&str> {
        self.sections().nth(position).map(Section::name)
    }

    #[must_use]
    pub fn key_name_at(&self, section: &str, position: usize) -> Option<&str> {
        self.section(section)?
            .entries()
            .nth(position)
            .map(Entry::key)
    }

    #[must_use]
    pub fn value_of(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    fn find_section(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<Entry>,
}

impl Section {
    #[must_use]
    fn new(name: String) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries from newest to oldest.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &Entry> + ExactSizeIterator {
        self.entries.iter().rev()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(Entry::value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    value: String,
}

impl Entry {
    fn try_new(key: &str, value: &str) -> Result<Self, DocumentError> {
        Ok(Self {
            key: try_to_owned(key)?,
            value: try_to_owned(value)?,
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

fn try_to_owned(s: &str) -> Result<String, DocumentError> {
    let mut owned = String::new();
    owned
        .try_reserve_exact(s.len())
        .map_err(|_| DocumentError::Allocation)?;
    owned.push_str(s);
    Ok(owned)
}
