//! Placeholder tokens
//!
//! A deferred helper writes a token into the rendered text in place of its
//! value. The token is the placeholder id wrapped in a pair of Unicode
//! private-use characters on both sides:
//!
//! ```text
//! U+E000 U+E000 <32 lowercase hex digits> U+E000 U+E000
//! ```
//!
//! Private-use code points never come out of ordinary template text and are
//! left untouched by HTML escaping, so a token survives `{{helper}}` output
//! and can be located with a plain scan afterwards.

use std::fmt;

use uuid::Uuid;

/// Delimiter on both sides of the id.
pub const SENTINEL: &str = "\u{E000}\u{E000}";

const ID_LEN: usize = 32;

/// Unique id of one deferred helper invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(Uuid);

impl PlaceholderId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The textual token emitted into rendered output for this id
    pub fn token(&self) -> String {
        format!("{SENTINEL}{}{SENTINEL}", self.0.simple())
    }

    fn parse(hex: &str) -> Option<Self> {
        if hex.len() != ID_LEN || !hex.bytes().all(is_lower_hex) {
            return None;
        }
        Uuid::try_parse(hex).ok().map(Self)
    }
}

impl Default for PlaceholderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

fn is_lower_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'a'..=b'f').contains(&b)
}

/// A token located in rendered text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch {
    /// Byte offset of the opening sentinel
    pub start: usize,
    /// Byte offset just past the closing sentinel
    pub end: usize,
    pub id: PlaceholderId,
}

/// Iterator over well-formed tokens, left to right, non-overlapping.
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
}

/// Scan `text` for placeholder tokens.
///
/// Stray private-use characters that do not form a complete token are
/// skipped over and treated as ordinary text.
pub fn find_tokens(text: &str) -> Tokens<'_> {
    Tokens { text, pos: 0 }
}

impl Iterator for Tokens<'_> {
    type Item = TokenMatch;

    fn next(&mut self) -> Option<TokenMatch> {
        while let Some(offset) = self.text.get(self.pos..)?.find(SENTINEL) {
            let start = self.pos + offset;
            let id_start = start + SENTINEL.len();
            let id_end = id_start + ID_LEN;

            let id = self
                .text
                .get(id_start..id_end)
                .and_then(PlaceholderId::parse);
            let closed = self
                .text
                .get(id_end..)
                .is_some_and(|rest| rest.starts_with(SENTINEL));

            match id {
                Some(id) if closed => {
                    let end = id_end + SENTINEL.len();
                    self.pos = end;
                    return Some(TokenMatch { start, end, id });
                }
                // Step over one delimiter char; the next one may open a token.
                _ => self.pos = start + '\u{E000}'.len_utf8(),
            }
        }
        self.pos = self.text.len();
        None
    }
}

impl Tokens<'_> {
    /// Discard `m` and resume scanning just after its first delimiter char.
    ///
    /// A rejected match may have swallowed the opening delimiter of a real
    /// token, so scanning must not skip to `m.end`.
    pub fn reject(&mut self, m: &TokenMatch) {
        self.pos = m.start + '\u{E000}'.len_utf8();
    }
}

/// Rebuild `text` with tokens replaced in a single pass.
///
/// `replacement` is called once per token-shaped match, in text order. `None`
/// keeps the matched text and rescans from inside it, so an unknown match
/// cannot hide a known token that overlaps it.
pub fn replace_tokens<F, S>(text: &str, mut replacement: F) -> String
where
    F: FnMut(PlaceholderId) -> Option<S>,
    S: AsRef<str>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut tokens = find_tokens(text);
    while let Some(m) = tokens.next() {
        match replacement(m.id) {
            Some(value) => {
                out.push_str(&text[last..m.start]);
                out.push_str(value.as_ref());
                last = m.end;
            }
            None => tokens.reject(&m),
        }
    }
    out.push_str(&text[last..]);
    out
}
