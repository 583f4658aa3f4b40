//! Compatibility flags (spec.md §4.1, §6.2).
//!
//! ECMA-262 3rd edition left several lexer/parser behaviors
//! implementation-defined; these flags expose them as runtime toggles
//! rather than compile-time features, since a host may need to parse
//! script from more than one compatibility era in the same process: a
//! bitflag-style struct with a whitespace-separated string encoding,
//! `no_`-prefixed negation for disabling a flag that's on by default.

use std::fmt;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompatFlags: u16 {
        /// Treat `<!--` and `-->` as line comments (old SGML-compatibility
        /// behavior some browsers shipped).
        const SGML_COMMENTS = 1 << 0;
        /// Tolerate malformed UTF-8/UTF-16 input instead of raising a
        /// `SyntaxError` at the first ill-formed sequence.
        const UTF_UNSAFE = 1 << 1;
        /// Enable the handful of ECMA-262 3rd edition Annex B / errata
        /// behaviors SEE calls `262_3b` (e.g. octal escape sequences in
        /// string literals).
        const ECMA_262_3B = 1 << 2;
        /// SEE's `ext1` grab-bag extension flag: leading-zero octal integer
        /// literals, bare `\x`/`\u` string escapes, and letting the receiver
        /// of an indirect `eval` call supply `this`/a scope extension rather
        /// than always running against the global object.
        const EXT1 = 1 << 3;
        const JS11 = 1 << 4;
        const JS12 = 1 << 5;
        const JS13 = 1 << 6;
        const JS14 = 1 << 7;
        const JS15 = 1 << 8;
    }
}

impl Default for CompatFlags {
    /// ECMA-262 3rd edition strict compliance: no SGML comments, no lenient
    /// UTF handling, no Annex B, no extensions.
    fn default() -> Self {
        Self::empty()
    }
}

const NAMED_FLAGS: &[(&str, CompatFlags)] = &[
    ("sgml_comments", CompatFlags::SGML_COMMENTS),
    ("utf_unsafe", CompatFlags::UTF_UNSAFE),
    ("262_3b", CompatFlags::ECMA_262_3B),
    ("ext1", CompatFlags::EXT1),
    ("js11", CompatFlags::JS11),
    ("js12", CompatFlags::JS12),
    ("js13", CompatFlags::JS13),
    ("js14", CompatFlags::JS14),
    ("js15", CompatFlags::JS15),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCompatFlag(pub String);

impl fmt::Display for UnknownCompatFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown compatibility flag: {}", self.0)
    }
}
impl std::error::Error for UnknownCompatFlag {}

impl CompatFlags {
    /// Parses a whitespace-separated flag list, e.g. `"ext1 no_utf_unsafe"`.
    /// A bare name turns a flag on; a `no_`-prefixed name turns it off
    /// relative to whatever the accumulator already held, matching the
    /// teacher's `capability.rs` token grammar.
    pub fn parse(spec: &str) -> Result<Self, UnknownCompatFlag> {
        let mut flags = Self::default();
        for token in spec.split_whitespace() {
            let (negate, name) = match token.strip_prefix("no_") {
                Some(rest) => (true, rest),
                None => (false, token),
            };
            let &(_, bit) =
                NAMED_FLAGS.iter().find(|(n, _)| *n == name).ok_or_else(|| UnknownCompatFlag(token.to_owned()))?;
            flags.set(bit, !negate);
        }
        Ok(flags)
    }

    #[must_use]
    pub fn encode(self) -> String {
        NAMED_FLAGS.iter().filter(|(_, bit)| self.contains(*bit)).map(|(name, _)| *name).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_encode() {
        let flags = CompatFlags::parse("ext1 262_3b").unwrap();
        assert!(flags.contains(CompatFlags::EXT1));
        assert!(flags.contains(CompatFlags::ECMA_262_3B));
        assert!(!flags.contains(CompatFlags::SGML_COMMENTS));
    }

    #[test]
    fn no_prefix_clears_a_flag() {
        let flags = CompatFlags::parse("ext1 262_3b no_ext1").unwrap();
        assert!(!flags.contains(CompatFlags::EXT1));
        assert!(flags.contains(CompatFlags::ECMA_262_3B));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(CompatFlags::parse("bogus").is_err());
    }
}
