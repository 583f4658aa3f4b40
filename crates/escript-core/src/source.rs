//! Source input (spec.md §4.1, §6.1): the UCS-32 input filter the lexer
//! reads from, with the 6-codepoint lookahead window the longest lookahead
//! in the lexer grammar needs (`>>>=`, six characters, is the longest
//! multi-character punctuator token).
//!
//! A [`Source`] owns its text as a `Vec<char>` (UCS-32 — one `u32`-ish slot
//! per Unicode scalar value) decoded once up front, rather than decoding
//! UTF-8 byte-by-byte during lexing. This matches spec.md §4.1's "UCS-32
//! input filter" component literally and keeps the lexer's lookahead a
//! plain index into a slice instead of a multi-byte decode on every peek.

use crate::exception::CodeLoc;

/// How many codepoints of lookahead the lexer needs past the current
/// position. `>>>=` is the longest punctuator (6 characters); the lexer
/// never needs to look further ahead than that to decide which token it is
/// scanning.
pub const LOOKAHEAD: usize = 6;

#[derive(Debug, Clone)]
pub struct Source {
    name: Option<String>,
    chars: Vec<char>,
    compat_utf_unsafe: bool,
}

/// Raised constructing a [`Source`] from bytes that are not well-formed
/// UTF-8, unless [`crate::compat::CompatFlags::UTF_UNSAFE`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedInputError;

impl std::fmt::Display for MalformedInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("input is not well-formed UTF-8")
    }
}
impl std::error::Error for MalformedInputError {}

impl Source {
    /// Builds a `Source` from an in-memory UTF-8 string (`InputFromString`
    /// in spec.md §6.1's terminology).
    #[must_use]
    pub fn from_str(name: Option<&str>, text: &str) -> Self {
        Self { name: name.map(str::to_owned), chars: text.chars().collect(), compat_utf_unsafe: false }
    }

    /// Builds a `Source` from raw bytes (`InputFromUtf8`), tolerating
    /// malformed sequences (replacing with U+FFFD) only when `utf_unsafe`
    /// is requested; otherwise rejects up front.
    pub fn from_utf8(name: Option<&str>, bytes: &[u8], utf_unsafe: bool) -> Result<Self, MalformedInputError> {
        let text = if utf_unsafe {
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            std::str::from_utf8(bytes).map_err(|_| MalformedInputError)?.to_owned()
        };
        Ok(Self { name: name.map(str::to_owned), chars: text.chars().collect(), compat_utf_unsafe: utf_unsafe })
    }

    /// Builds a `Source` from a file on disk (`InputFromFile`). Takes
    /// already-read bytes rather than a path, since `escript-core` itself
    /// performs no file I/O (SPEC_FULL.md §0) — the host CLI shell reads the
    /// file and hands the bytes here.
    pub fn from_file_bytes(path: &str, bytes: &[u8], utf_unsafe: bool) -> Result<Self, MalformedInputError> {
        Self::from_utf8(Some(path), bytes, utf_unsafe)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Peeks up to [`LOOKAHEAD`] codepoints starting at `index`.
    #[must_use]
    pub fn peek_window(&self, index: usize) -> [Option<char>; LOOKAHEAD] {
        let mut window = [None; LOOKAHEAD];
        for (slot, c) in window.iter_mut().zip(self.chars.get(index..).unwrap_or(&[]).iter()) {
            *slot = Some(*c);
        }
        window
    }

    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end.min(self.chars.len())].iter().collect()
    }

    /// Computes a 1-based line/column for a codepoint index, for
    /// [`CodeLoc`]s attached to tokens and AST spans. O(n) in the index;
    /// only called when constructing a diagnostic, never on the lexer's hot
    /// path.
    #[must_use]
    pub fn loc_at(&self, index: usize) -> CodeLoc {
        let mut line = 1u32;
        let mut col = 1u32;
        for &c in self.chars.iter().take(index) {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        CodeLoc { line, column: col }
    }

    #[must_use]
    pub fn tolerates_malformed_utf8(&self) -> bool {
        self.compat_utf_unsafe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_window_is_shorter_near_eof() {
        let src = Source::from_str(None, "ab");
        let window = src.peek_window(0);
        assert_eq!(window[0], Some('a'));
        assert_eq!(window[1], Some('b'));
        assert_eq!(window[2], None);
    }

    #[test]
    fn loc_at_counts_lines() {
        let src = Source::from_str(None, "a\nbc");
        assert_eq!(src.loc_at(3), CodeLoc { line: 2, column: 2 });
    }

    #[test]
    fn malformed_utf8_rejected_without_flag() {
        let bytes = [0xFF, 0xFE];
        assert!(Source::from_utf8(None, &bytes, false).is_err());
        assert!(Source::from_utf8(None, &bytes, true).is_ok());
    }
}
