use std::{error, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
    /// Memory for a new section or entry could not be reserved. The document is unchanged.
    Allocation,
    /// An entry was inserted before any section was selected.
    NoActiveSection,
}

impl error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Allocation => f.write_str("failed to allocate memory"),
            Self::NoActiveSection => f.write_str("no section has been selected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    line: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    #[must_use]
    pub(crate) fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    /// 1-based line number where parsing stopped.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    Document { source: DocumentError },
    EntryOutsideSection,
    KeyEmpty,
    MissingDelimiter,
    SectionNameEmpty,
    SectionNameTooLong,
    UnexpectedCharacter { c: char },
    UnterminatedSectionName,
    UnterminatedString,
}

impl From<DocumentError> for ParseErrorKind {
    fn from(source: DocumentError) -> Self {
        match source {
            DocumentError::NoActiveSection => Self::EntryOutsideSection,
            DocumentError::Allocation => Self::Document { source },
        }
    }
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.kind {
            ParseErrorKind::Document { ref source } => Some(source),
            ParseErrorKind::EntryOutsideSection
            | ParseErrorKind::KeyEmpty
            | ParseErrorKind::MissingDelimiter
            | ParseErrorKind::SectionNameEmpty
            | ParseErrorKind::SectionNameTooLong
            | ParseErrorKind::UnexpectedCharacter { .. }
            | ParseErrorKind::UnterminatedSectionName
            | ParseErrorKind::UnterminatedString => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;

        match self.kind {
            ParseErrorKind::Document { source: _ } => f.write_str("failed to update document"),
            ParseErrorKind::EntryOutsideSection => f.write_str("entry appears before any section"),
            ParseErrorKind::KeyEmpty => f.write_str("key cannot be empty"),
            ParseErrorKind::MissingDelimiter => f.write_str("expected '=' between key and value"),
            ParseErrorKind::SectionNameEmpty => f.write_str("section name cannot be empty"),
            ParseErrorKind::SectionNameTooLong => {
                f.write_str("section name cannot exceed 255 characters")
            }
            ParseErrorKind::UnexpectedCharacter { c } => write!(f, "unexpected character: {c:?}"),
            ParseErrorKind::UnterminatedSectionName => f.write_str("expected ']' after section name"),
            ParseErrorKind::UnterminatedString => f.write_str("unterminated string"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn display_includes_line() {
        let error = ParseError::new(7, ParseErrorKind::UnexpectedCharacter { c: 'x' });

        assert_eq!(error.to_string(), "line 7: unexpected character: 'x'");
    }

    #[test]
    fn missing_section_maps_to_entry_outside_section() {
        assert_eq!(
            ParseErrorKind::from(DocumentError::NoActiveSection),
            ParseErrorKind::EntryOutsideSection
        );
    }

    #[test]
    fn allocation_failure_is_the_source() {
        let error = ParseError::new(1, DocumentError::Allocation.into());

        assert!(error.source().is_some());
    }
}
