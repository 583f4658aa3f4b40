//! The string model (spec.md §3.2): UTF-16 code-unit sequences in three
//! flavors behind one handle type, [`JsString`].
//!
//! ECMA-262 strings are sequences of 16-bit code units, not Unicode scalar
//! values — a string may contain lone surrogates. We store the code units
//! directly (`Vec<u16>` / `&'static [u16]`) rather than going through `String`,
//! so that lone surrogates round-trip losslessly through the lexer and the
//! evaluator. Conversion to UTF-8 (for host output) honors surrogate pairs
//! and raises on lone surrogates, per spec.md §3.2.

use std::{fmt, rc::Rc};

/// Shared, immutable handle to a UTF-16 string.
///
/// Three flavors coexist behind this one type, matching spec.md §3.2:
///
/// * [`StringData::Growable`] — backs runtime string concatenation; doubles
///   capacity starting at 256 code units.
/// * [`StringData::Static`] — backs source-derived literals that never grow;
///   attempting to grow one is a programmer error in this crate (`put`/
///   `append` on a static string panics rather than raising, since only
///   internal code ever holds a mutable reference to string data — scripts
///   only ever see the immutable `JsString` handle).
/// * [`StringData::Interned`] — a canonicalized instance out of an
///   [`crate::intern::Interner`]; two interned strings from the same table
///   compare equal iff their underlying `Rc` pointers are equal.
#[derive(Clone)]
pub struct JsString(Rc<StringData>);

enum StringData {
    Growable(Vec<u16>),
    Static(&'static [u16]),
    Interned(Box<[u16]>),
}

impl JsString {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        Self(Rc::new(StringData::Growable(s.encode_utf16().collect())))
    }

    #[must_use]
    pub fn from_units(units: Vec<u16>) -> Self {
        Self(Rc::new(StringData::Growable(units)))
    }

    #[must_use]
    pub fn from_static(units: &'static [u16]) -> Self {
        Self(Rc::new(StringData::Static(units)))
    }

    #[must_use]
    pub fn interned(units: Vec<u16>) -> Self {
        Self(Rc::new(StringData::Interned(units.into_boxed_slice())))
    }

    #[must_use]
    pub fn units(&self) -> &[u16] {
        match &*self.0 {
            StringData::Growable(v) => v,
            StringData::Static(s) => s,
            StringData::Interned(b) => b,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units().is_empty()
    }

    #[must_use]
    pub fn is_interned(&self) -> bool {
        matches!(&*self.0, StringData::Interned(_))
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(&*self.0, StringData::Static(_))
    }

    /// Whether this and `other` are the *same* interned instance.
    ///
    /// Two interned strings are equal iff their pointers are equal (spec.md
    /// §3.2). For non-interned strings this falls back to content
    /// comparison, which is always correct but not what interning exists to
    /// avoid — callers on a hot path should intern first.
    #[must_use]
    pub fn same_interned(&self, other: &Self) -> bool {
        if self.is_interned() && other.is_interned() {
            Rc::ptr_eq(&self.0, &other.0)
        } else {
            self.units() == other.units()
        }
    }

    /// Concatenates two strings into a fresh growable string.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut units = Vec::with_capacity((self.len() + other.len()).max(256));
        units.extend_from_slice(self.units());
        units.extend_from_slice(other.units());
        Self::from_units(units)
    }

    /// Appends `more` to a growable string in place.
    ///
    /// # Panics
    /// Panics if called on a [`StringData::Static`] instance — static
    /// strings never grow, matching spec.md §3.2 ("trying to grow one
    /// raises"); since static strings never escape to script code as
    /// mutable references, this can only be a bug in this crate.
    pub fn append(&mut self, more: &str) {
        match Rc::get_mut(&mut self.0) {
            Some(StringData::Growable(v)) => v.extend(more.encode_utf16()),
            _ => {
                let mut units = self.units().to_vec();
                units.extend(more.encode_utf16());
                self.0 = Rc::new(StringData::Growable(units));
            }
        }
    }

    /// Converts to UTF-8 for host output.
    ///
    /// Honors surrogate pairs; a lone surrogate raises [`LoneSurrogateError`]
    /// rather than silently substituting U+FFFD, per spec.md §3.2.
    pub fn to_host_string(&self) -> Result<String, LoneSurrogateError> {
        String::from_utf16(self.units()).map_err(|_| LoneSurrogateError)
    }

    /// Lossy UTF-8 conversion (replaces lone surrogates with U+FFFD).
    ///
    /// Used for diagnostics where a best-effort rendering is preferable to a
    /// hard failure (error messages, tracer output).
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.units())
    }
}

impl PartialEq for JsString {
    fn eq(&self, other: &Self) -> bool {
        self.units() == other.units()
    }
}
impl Eq for JsString {}

impl std::hash::Hash for JsString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.units().hash(state);
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsString({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// A string contained a lone (unpaired) surrogate code unit and cannot be
/// represented as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoneSurrogateError;

impl fmt::Display for LoneSurrogateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("string contains an unpaired UTF-16 surrogate and cannot be converted to UTF-8")
    }
}
impl std::error::Error for LoneSurrogateError {}

/// Lexicographic comparison over UTF-16 code units, as ECMA-262 §11.8.5
/// requires for the abstract relational comparison operator.
#[must_use]
pub fn compare_code_units(a: &JsString, b: &JsString) -> std::cmp::Ordering {
    a.units().cmp(b.units())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_preserves_content() {
        let a = JsString::from_str("foo");
        let b = JsString::from_str("bar");
        assert_eq!(a.concat(&b).to_string_lossy(), "foobar");
    }

    #[test]
    fn equality_is_by_content() {
        assert_eq!(JsString::from_str("abc"), JsString::from_str("abc"));
        assert_ne!(JsString::from_str("abc"), JsString::from_str("abd"));
    }

    #[test]
    fn lone_surrogate_rejected_on_utf8_conversion() {
        let s = JsString::from_units(vec![0xD800]);
        assert!(s.to_host_string().is_err());
    }

    #[test]
    fn surrogate_pair_round_trips() {
        // U+1F600 GRINNING FACE, encoded as a surrogate pair.
        let s = JsString::from_units(vec![0xD83D, 0xDE00]);
        assert_eq!(s.to_host_string().unwrap(), "\u{1F600}");
    }
}
