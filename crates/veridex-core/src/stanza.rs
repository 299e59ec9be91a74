//! Stanza parser for blank-line-delimited index blobs.
//!
//! A stanza is a contiguous run of non-blank lines; a blank line (or end of
//! input) terminates it. Field lines have the shape `Key:<spaces>value`. The
//! parser is lazy, finite, and restartable: re-parsing the same text yields
//! identical output. Malformed lines are skipped, never fatal (fail-soft).

use std::collections::HashMap;

use crate::model::Stanza;

/// Parse an index text blob into a lazy stanza stream.
pub fn parse(text: &str) -> StanzaParser<'_> {
    StanzaParser {
        lines: text.split('\n').enumerate(),
        current: None,
    }
}

/// Lazy iterator over the stanzas of one index blob.
#[derive(Debug)]
pub struct StanzaParser<'a> {
    lines: std::iter::Enumerate<std::str::Split<'a, char>>,
    current: Option<Stanza>,
}

impl<'a> Iterator for StanzaParser<'a> {
    type Item = Stanza;

    fn next(&mut self) -> Option<Stanza> {
        for (idx, raw) in self.lines.by_ref() {
            // Tolerate either line-ending convention: strip a trailing CR
            // before any comparison.
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let line_no = idx + 1;

            if line.is_empty() {
                // Blank line closes the current stanza; emit it if any field
                // was actually set.
                if let Some(stanza) = self.current.take() {
                    if !stanza.fields.is_empty() {
                        return Some(stanza);
                    }
                }
                continue;
            }

            let stanza = self.current.get_or_insert_with(|| Stanza {
                start_line: line_no,
                fields: HashMap::new(),
            });

            match parse_field_line(line) {
                Some((key, value)) => {
                    // Duplicate keys are last-write-wins.
                    stanza.fields.insert(key.to_string(), value.to_string());
                }
                None => {
                    tracing::debug!(line = line_no, "skipping malformed index line");
                }
            }
        }

        // End of input implicitly closes an open stanza.
        match self.current.take() {
            Some(stanza) if !stanza.fields.is_empty() => Some(stanza),
            _ => None,
        }
    }
}

/// Split a `Key:<one-or-more-spaces>value` line. The value runs to end of
/// line and is not trimmed further. Returns `None` for lines that do not
/// have that shape.
fn parse_field_line(line: &str) -> Option<(&str, &str)> {
    let (key, rest) = line.split_once(':')?;
    if key.is_empty() || !rest.starts_with(' ') {
        return None;
    }
    Some((key, rest.trim_start_matches(' ')))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = "Name: foo\nVersion: 1.2-1\nHash: aabb\n\nName: bar\nVersion: 2.0\nHash: ccdd\n";

    #[test]
    fn splits_on_blank_lines() {
        let stanzas: Vec<_> = parse(BLOB).collect();
        assert_eq!(stanzas.len(), 2);
        assert_eq!(stanzas[0].field("Name"), Some("foo"));
        assert_eq!(stanzas[1].field("Name"), Some("bar"));
    }

    #[test]
    fn start_line_is_first_content_line() {
        let stanzas: Vec<_> = parse(BLOB).collect();
        assert_eq!(stanzas[0].start_line, 1);
        assert_eq!(stanzas[1].start_line, 5);
    }

    #[test]
    fn start_line_skips_leading_blank_lines() {
        let blob = "\n\nName: foo\n";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].start_line, 3);
    }

    #[test]
    fn crlf_line_endings_are_normalized() {
        let blob = "Name: foo\r\nVersion: 1.0\r\n\r\nName: bar\r\n";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(stanzas.len(), 2);
        assert_eq!(stanzas[0].field("Version"), Some("1.0"));
        assert_eq!(stanzas[1].start_line, 4);
    }

    #[test]
    fn open_stanza_is_closed_at_end_of_input() {
        let blob = "Name: foo\nVersion: 1.0";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].field("Version"), Some("1.0"));
    }

    #[test]
    fn duplicate_keys_are_last_write_wins() {
        let blob = "Name: foo\nName: bar\n";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(stanzas[0].field("Name"), Some("bar"));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let blob = "garbage without colon\nName: foo\n:broken\nNoSpaceAfter:colon\n";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].field("Name"), Some("foo"));
        // Malformed first line still anchors the stanza's start line.
        assert_eq!(stanzas[0].start_line, 1);
    }

    #[test]
    fn value_runs_to_end_of_line_untrimmed() {
        let blob = "Desc:  two leading separator spaces and trailing  \n";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(
            stanzas[0].field("Desc"),
            Some("two leading separator spaces and trailing  ")
        );
    }

    #[test]
    fn unrecognized_keys_are_retained() {
        let blob = "Name: foo\nX-Custom-Field: anything\n";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(stanzas[0].field("X-Custom-Field"), Some("anything"));
    }

    #[test]
    fn stanza_with_only_malformed_lines_is_not_emitted() {
        let blob = "no colon here\nalso none\n\nName: foo\n";
        let stanzas: Vec<_> = parse(blob).collect();
        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].field("Name"), Some("foo"));
    }

    #[test]
    fn parser_is_restartable() {
        let first: Vec<_> = parse(BLOB).collect();
        let second: Vec<_> = parse(BLOB).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_yields_no_stanzas() {
        assert_eq!(parse("").count(), 0);
        assert_eq!(parse("\n\n\n").count(), 0);
    }
}
