use std::iter::Enumerate;
use std::str::Lines;

use log::debug;

use crate::document::Document;
use crate::error::{ParseError, ParseErrorKind};

/// <https://en.wikipedia.org/wiki/Byte_order_mark>
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];

const SECTION_NAME_MAX_LEN: usize = 255;

/// Decode raw file contents into text.
///
/// UTF-16 LE is recognized by its BOM. Anything else is read as UTF-8, replacing invalid
/// sequences.
#[must_use]
pub fn decode(data: &[u8]) -> String {
    // Windows editors still save INI files as UTF-16 LE ("Unicode" in Notepad).
    if let Some(rest) = data.strip_prefix(BOM_UTF16_LE) {
        let utf16 = rest
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .collect::<Vec<u16>>();

        char::decode_utf16(utf16)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect::<String>()
    } else {
        let data = data.strip_prefix(BOM_UTF8).unwrap_or(data);
        String::from_utf8_lossy(data).into_owned()
    }
}

/// Feeds INI text into a [`Document`] one line at a time.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }
}

impl Parser<'_> {
    /// Build a document called `name` from the remaining lines.
    pub fn into_document(self, name: impl Into<String>) -> Result<Document, ParseError> {
        let mut document = Document::new(name);
        self.extend(&mut document)?;

        debug!(
            "{}: parsed {} section(s)",
            document.name(),
            document.section_count()
        );

        Ok(document)
    }

    /// Add the remaining lines to an existing document.
    ///
    /// Entries continue into whichever section `document` last selected, so a document can be
    /// assembled from several sources.
    pub fn extend(self, document: &mut Document) -> Result<(), ParseError> {
        for (i, line) in self.lines {
            parse_line(document, line).map_err(|kind| ParseError::new(i + 1, kind))?;
        }

        Ok(())
    }
}

fn parse_line(document: &mut Document, line: &str) -> Result<(), ParseErrorKind> {
    let line = line.trim();

    match line.chars().next() {
        None | Some(';' | '#') => {}
        Some('[') => {
            let name = parse_section_name(&line[1..])?;
            document.select_section(name)?;
        }
        Some(_) => {
            let (key, value) = parse_entry(line)?;
            document.insert_entry(&key, &value)?;
        }
    }

    Ok(())
}

/// Parse the remainder of a section header after the opening bracket.
fn parse_section_name(header: &str) -> Result<&str, ParseErrorKind> {
    let (name, trailing) = header
        .split_once(']')
        .ok_or(ParseErrorKind::UnterminatedSectionName)?;

    if name.is_empty() {
        return Err(ParseErrorKind::SectionNameEmpty);
    } else if name.len() > SECTION_NAME_MAX_LEN {
        return Err(ParseErrorKind::SectionNameTooLong);
    }

    // Only whitespace or a comment may follow the closing bracket.
    for c in trailing.chars() {
        match c {
            ';' | '#' => break,
            c if c.is_whitespace() => {}
            c => return Err(ParseErrorKind::UnexpectedCharacter { c }),
        }
    }

    Ok(name)
}

fn parse_entry(line: &str) -> Result<(String, String), ParseErrorKind> {
    let line = strip_inline_comment(line)?;

    // Split on the first '=' outside quotes so quoted keys may contain one.
    let mut within_quotes = false;
    let equal = line
        .char_indices()
        .find_map(|(i, c)| match c {
            '"' => {
                within_quotes = !within_quotes;
                None
            }
            '=' if !within_quotes => Some(i),
            _ => None,
        })
        .ok_or(ParseErrorKind::MissingDelimiter)?;

    let key = normalize_value(&line[..equal])?;
    if key.is_empty() {
        return Err(ParseErrorKind::KeyEmpty);
    }

    Ok((key, normalize_value(&line[equal + 1..])?))
}

fn strip_inline_comment(line: &str) -> Result<&str, ParseErrorKind> {
    let mut within_quotes = false;

    for (i, c) in line.char_indices() {
        match c {
            '"' => within_quotes = !within_quotes,
            ';' if !within_quotes => return Ok(line[..i].trim_end()),
            _ => {}
        }
    }

    if within_quotes {
        Err(ParseErrorKind::UnterminatedString)
    } else {
        Ok(line)
    }
}

fn normalize_value(value: &str) -> Result<String, ParseErrorKind> {
    let value = value.trim();

    match (value.starts_with('"'), value.ends_with('"')) {
        (true, true) if value.len() >= 2 => unquote(&value[1..value.len() - 1]),
        (false, false) => Ok(value.replace("\"\"", "\"")),
        _ => Err(ParseErrorKind::UnterminatedString),
    }
}

/// Collapse `""` escapes inside a quoted string. A lone `"` would have closed the string early.
fn unquote(inner: &str) -> Result<String, ParseErrorKind> {
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == '"' && chars.next() != Some('"') {
            return Err(ParseErrorKind::UnterminatedString);
        }

        result.push(c);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;

    fn parse(text: &str) -> Result<Document, ParseError> {
        Parser::new(text).into_document("test.ini")
    }

    #[test]
    fn sections_and_entries() {
        let document = parse(
            "
; This is a comment
[server]
host = localhost
port=8080

# Another comment
[client] ; trailing comment
timeout = 30
",
        )
        .expect("failed to parse hardcoded INI file");

        assert_eq!(document.name(), "test.ini");
        assert_eq!(document.section_count(), 2);
        assert_eq!(document.section_name_at(0), Some("client"));
        assert_eq!(document.value_of("server", "host"), Some("localhost"));
        assert_eq!(document.value_of("server", "port"), Some("8080"));
        assert_eq!(document.value_of("client", "timeout"), Some("30"));
    }

    #[test]
    fn repeated_section_merges_and_keeps_first_value() {
        let document = parse(
            "
[a]
key = first
[b]
[a]
key = second
other = value
",
        )
        .expect("failed to parse hardcoded INI file");

        assert_eq!(document.section_count(), 2);
        assert_eq!(document.key_count("a"), 2);
        assert_eq!(document.value_of("a", "key"), Some("first"));
        assert_eq!(document.key_count("b"), 0);
    }

    #[test]
    fn quoted_value_with_semicolon() {
        let document = parse(
            r#"
[Section]
key = "value;not-a-comment" ; This is an inline comment.
quote = "say ""hi"""
empty =
"#,
        )
        .expect("failed to parse hardcoded INI file");

        assert_eq!(
            document.value_of("Section", "key"),
            Some("value;not-a-comment")
        );
        assert_eq!(document.value_of("Section", "quote"), Some(r#"say "hi""#));
        assert_eq!(document.value_of("Section", "empty"), Some(""));
    }

    #[test]
    fn value_keeps_equal_signs() {
        let document =
            parse("[math]\nsum = 1+1=2\r\n").expect("failed to parse hardcoded INI file");

        assert_eq!(document.value_of("math", "sum"), Some("1+1=2"));
    }

    #[test]
    fn quoted_key_with_equal() {
        let document =
            parse("[a]\n\"a=b\" = c\n").expect("failed to parse hardcoded INI file");

        assert_eq!(document.value_of("a", "a=b"), Some("c"));
        assert_eq!(document.key_name_at("a", 0), Some("a=b"));
    }

    #[test]
    fn entry_before_section() {
        let error = parse("\nkey = value\n").expect_err("expected entry without section to fail");

        assert_eq!(error.line(), 2);
        assert_eq!(error.kind(), &ParseErrorKind::EntryOutsideSection);
    }

    #[test]
    fn section_name_errors() {
        let too_long = format!("[{}]", "x".repeat(256));

        let cases = [
            ("[]", ParseErrorKind::SectionNameEmpty),
            ("[open", ParseErrorKind::UnterminatedSectionName),
            ("[name] junk", ParseErrorKind::UnexpectedCharacter { c: 'j' }),
            (too_long.as_str(), ParseErrorKind::SectionNameTooLong),
        ];

        for (text, expected) in cases {
            let error = parse(text).expect_err("expected malformed header to fail");
            assert_eq!(error.kind(), &expected, "{text:?}");
        }
    }

    #[test]
    fn entry_errors() {
        let cases = [
            ("[s]\nno delimiter", ParseErrorKind::MissingDelimiter),
            ("[s]\n = value", ParseErrorKind::KeyEmpty),
            ("[s]\nkey = \"open", ParseErrorKind::UnterminatedString),
            ("[s]\nk = \"x\" \"y\"", ParseErrorKind::UnterminatedString),
            ("[s]\n\"a=b\"", ParseErrorKind::MissingDelimiter),
            ("[s]\n\"\" = value", ParseErrorKind::KeyEmpty),
        ];

        for (text, expected) in cases {
            let error = parse(text).expect_err("expected malformed entry to fail");
            assert_eq!(error.line(), 2, "{text:?}");
            assert_eq!(error.kind(), &expected, "{text:?}");
        }
    }

    #[test]
    fn extend_continues_current_section() {
        let mut document = Document::new("merged");
        Parser::new("[a]\none = 1")
            .extend(&mut document)
            .expect("failed to parse first source");
        Parser::new("two = 2")
            .extend(&mut document)
            .expect("failed to parse second source");

        assert_eq!(document.key_count("a"), 2);
        assert_eq!(document.key_name_at("a", 0), Some("two"));
    }

    #[test]
    fn decode_utf16_le() {
        let mut data = BOM_UTF16_LE.to_vec();
        data.extend("[a]".encode_utf16().flat_map(u16::to_le_bytes));

        assert_eq!(decode(&data), "[a]");
    }

    #[test]
    fn decode_utf8_bom() {
        assert_eq!(decode(b"\xEF\xBB\xBF[a]"), "[a]");
        assert_eq!(decode(b"[a]"), "[a]");
    }

    #[test]
    fn allocation_error_kind() {
        assert_eq!(
            ParseErrorKind::from(DocumentError::Allocation),
            ParseErrorKind::Document {
                source: DocumentError::Allocation
            }
        );
    }
}
