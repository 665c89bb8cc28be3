use memchr::{memchr2, memchr3};
use smallvec::SmallVec;

/// Scanner state carried between pushes.
///
/// Kept as a plain value so the scan loop can be exercised in isolation from
/// any stream machinery: brace depth, whether the cursor sits inside a quoted
/// string, whether the next character is escaped, and the byte offset of the
/// currently open top-level span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    pub depth: u32,
    pub in_string: bool,
    pub escape_pending: bool,
    pub span_start: Option<usize>,
}

/// Extracts balanced top-level `{...}` spans from an incrementally grown
/// text buffer.
///
/// Upstream chunk boundaries never align with object boundaries; the scanner
/// owns the unconsumed suffix and resumes exactly where the previous push
/// stopped, so each byte is visited once. Braces are only counted outside
/// quoted strings, and a backslash escapes exactly the next character.
///
/// An extracted span is balanced, not guaranteed to be valid JSON; the
/// caller treats a parse failure per span as recoverable.
#[derive(Debug, Default)]
pub struct ObjectScanner {
    buffer: String,
    /// Byte offset scanning resumes from on the next push.
    pos: usize,
    state: ScanState,
}

impl ObjectScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconsumed text held for the next push.
    #[must_use]
    pub fn leftover(&self) -> &str {
        &self.buffer
    }

    /// Scanner state snapshot.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Append decoded text and return every span the appended text completes.
    ///
    /// Depth-0 text before an opening `{` (array framing, commas, stray
    /// closers) is junk: it waits in the buffer and is dropped together with
    /// the next completed span. Text after the last completed span stays as
    /// leftover.
    pub fn push(&mut self, text: &str) -> SmallVec<[String; 2]> {
        self.buffer.push_str(text);
        let mut spans: SmallVec<[String; 2]> = SmallVec::new();
        let mut consumed = 0usize;
        let bytes = self.buffer.as_bytes();
        let mut i = self.pos;

        while i < bytes.len() {
            if self.state.in_string {
                if self.state.escape_pending {
                    self.state.escape_pending = false;
                    i += 1;
                    continue;
                }
                // Fast-forward to the next quote or backslash.
                match memchr2(b'"', b'\\', &bytes[i..]) {
                    Some(rel) => {
                        i += rel;
                        if bytes[i] == b'\\' {
                            self.state.escape_pending = true;
                        } else {
                            self.state.in_string = false;
                        }
                        i += 1;
                    }
                    None => i = bytes.len(),
                }
                continue;
            }

            // Outside a string only quotes and braces are structural.
            match memchr3(b'"', b'{', b'}', &bytes[i..]) {
                Some(rel) => {
                    i += rel;
                    match bytes[i] {
                        b'"' => self.state.in_string = true,
                        b'{' => {
                            if self.state.depth == 0 {
                                self.state.span_start = Some(i);
                            }
                            self.state.depth += 1;
                        }
                        _ => {
                            if self.state.depth > 0 {
                                self.state.depth -= 1;
                                if self.state.depth == 0 {
                                    if let Some(start) = self.state.span_start.take() {
                                        spans.push(self.buffer[start..=i].to_string());
                                        consumed = i + 1;
                                    }
                                }
                            }
                            // A `}` at depth 0 is junk awaiting more context.
                        }
                    }
                    i += 1;
                }
                None => i = bytes.len(),
            }
        }

        self.pos = i;
        if consumed > 0 {
            // Drop extracted spans and any junk before them; offsets for the
            // retained suffix shift down by the cut.
            self.buffer.drain(..consumed);
            self.pos -= consumed;
            if let Some(start) = self.state.span_start.as_mut() {
                *start -= consumed;
            }
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectScanner;

    fn push_all(scanner: &mut ObjectScanner, text: &str) -> Vec<String> {
        scanner.push(text).into_vec()
    }

    #[test]
    fn extracts_single_object() {
        let mut scanner = ObjectScanner::new();
        let spans = push_all(&mut scanner, r#"{"a":1}"#);
        assert_eq!(spans, vec![r#"{"a":1}"#.to_string()]);
        assert!(scanner.leftover().is_empty());
    }

    #[test]
    fn escaped_quote_does_not_break_depth_tracking() {
        let mut scanner = ObjectScanner::new();
        let spans = push_all(&mut scanner, r#"{"a":"x\"y"}"#);
        assert_eq!(spans, vec![r#"{"a":"x\"y"}"#.to_string()]);
    }

    #[test]
    fn braces_inside_strings_are_not_structural() {
        let mut scanner = ObjectScanner::new();
        let spans = push_all(&mut scanner, r#"{"a":"{not a brace}"}"#);
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn object_split_across_pushes_completes_on_second() {
        let mut scanner = ObjectScanner::new();
        assert!(push_all(&mut scanner, r#"{"a":"#).is_empty());
        let spans = push_all(&mut scanner, "1}");
        assert_eq!(spans, vec![r#"{"a":1}"#.to_string()]);
    }

    #[test]
    fn nested_objects_stay_one_span() {
        let mut scanner = ObjectScanner::new();
        let spans = push_all(&mut scanner, r#"{"a":{"b":{"c":1}}}"#);
        assert_eq!(spans, vec![r#"{"a":{"b":{"c":1}}}"#.to_string()]);
    }

    #[test]
    fn array_framing_between_objects_is_skipped() {
        let mut scanner = ObjectScanner::new();
        let spans = push_all(&mut scanner, r#"[{"a":1},{"b":2}]"#);
        assert_eq!(
            spans,
            vec![r#"{"a":1}"#.to_string(), r#"{"b":2}"#.to_string()]
        );
        // The closing bracket is depth-0 junk kept as leftover.
        assert_eq!(scanner.leftover(), "]");
    }

    #[test]
    fn stray_closing_brace_is_junk_not_error() {
        let mut scanner = ObjectScanner::new();
        assert!(push_all(&mut scanner, "}garbage").is_empty());
        let spans = push_all(&mut scanner, r#"{"ok":true}"#);
        assert_eq!(spans, vec![r#"{"ok":true}"#.to_string()]);
        assert!(scanner.leftover().is_empty());
    }

    #[test]
    fn backslash_at_chunk_boundary_carries_escape_state() {
        let mut scanner = ObjectScanner::new();
        assert!(push_all(&mut scanner, r#"{"a":"x\"#).is_empty());
        let spans = push_all(&mut scanner, r#""y"}"#);
        assert_eq!(spans, vec![r#"{"a":"x\"y"}"#.to_string()]);
    }

    #[test]
    fn trailing_text_is_retained_as_leftover() {
        let mut scanner = ObjectScanner::new();
        let spans = push_all(&mut scanner, r#"{"a":1},{"part"#);
        assert_eq!(spans.len(), 1);
        assert_eq!(scanner.leftover(), r#",{"part"#);
        let spans = push_all(&mut scanner, r#"ial":2}"#);
        assert_eq!(spans, vec![r#"{"partial":2}"#.to_string()]);
    }

    #[test]
    fn multibyte_text_inside_strings_is_preserved() {
        let mut scanner = ObjectScanner::new();
        let spans = push_all(&mut scanner, r#"{"t":"héllo → wörld"}"#);
        assert_eq!(spans, vec![r#"{"t":"héllo → wörld"}"#.to_string()]);
    }

    #[test]
    fn state_is_default_between_objects() {
        let mut scanner = ObjectScanner::new();
        scanner.push(r#"{"a":1}"#);
        let state = scanner.state();
        assert_eq!(state.depth, 0);
        assert!(!state.in_string);
        assert!(!state.escape_pending);
        assert!(state.span_start.is_none());
    }
}
