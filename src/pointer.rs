//! RFC6901-style pointers and their URI-fragment form
//!
//! A `Pointer` is an ordered sequence of tokens locating a node inside a
//! tree; the root is the empty sequence. Tokens addressing array elements
//! are numeric strings, validated when the pointer is applied.
//!
//! The wire form is the URI fragment per RFC3986: tokens are escaped
//! (`~` as `~0`, `/` as `~1`), percent-encoded, joined with `/`, and
//! prefixed with a leading `/`. The root pointer encodes to the empty
//! fragment, so a full reference renders as `location#`.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::{ResolveError, Result};

/// Characters percent-encoded inside a fragment token. The URL fragment set
/// plus `%` (so literal percent signs round-trip) and `#` (so the fragment
/// cannot terminate early).
const FRAGMENT_TOKEN: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'%');

/// Ordered token path locating a node inside a tree
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The empty pointer, addressing the document root
    pub fn root() -> Pointer {
        Pointer { tokens: Vec::new() }
    }

    pub fn from_tokens<I, S>(tokens: I) -> Pointer
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Pointer {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Derived pointer one level deeper
    pub fn push(&self, token: impl Into<String>) -> Pointer {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Pointer { tokens }
    }

    /// Derived pointer one level up, or None at the root
    pub fn parent(&self) -> Option<Pointer> {
        if self.tokens.is_empty() {
            return None;
        }
        Some(Pointer {
            tokens: self.tokens[..self.tokens.len() - 1].to_vec(),
        })
    }

    /// Encode to URI-fragment form
    pub fn to_fragment(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            out.push('/');
            let escaped = token.replace('~', "~0").replace('/', "~1");
            out.push_str(&utf8_percent_encode(&escaped, FRAGMENT_TOKEN).to_string());
        }
        out
    }

    /// Decode from URI-fragment form (the text after `#`)
    ///
    /// The exact inverse of [`to_fragment`](Self::to_fragment). Fails with
    /// `PointerSyntax` on a missing leading slash, an invalid percent
    /// escape, or a `~` not followed by `0` or `1`.
    pub fn from_fragment(fragment: &str) -> Result<Pointer> {
        if fragment.is_empty() {
            return Ok(Pointer::root());
        }
        let body = fragment
            .strip_prefix('/')
            .ok_or_else(|| ResolveError::PointerSyntax {
                message: format!("pointer fragment must start with '/': '{fragment}'"),
            })?;
        let tokens = body
            .split('/')
            .map(decode_token)
            .collect::<Result<Vec<_>>>()?;
        Ok(Pointer { tokens })
    }
}

fn decode_token(raw: &str) -> Result<String> {
    // percent_decode_str passes malformed escapes through as literal text,
    // so reject them up front: every '%' must be followed by two hex digits
    let bytes = raw.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let valid = bytes.len() >= i + 3
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        if !valid {
            return Err(ResolveError::PointerSyntax {
                message: format!("invalid percent escape in pointer token '{raw}'"),
            });
        }
    }

    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|e| ResolveError::PointerSyntax {
            message: format!("invalid percent escape in pointer token '{raw}': {e}"),
        })?;

    let mut out = String::with_capacity(decoded.len());
    let mut chars = decoded.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            other => {
                return Err(ResolveError::PointerSyntax {
                    message: match other {
                        Some(c) => format!("invalid escape '~{c}' in pointer token '{raw}'"),
                        None => format!("dangling '~' at end of pointer token '{raw}'"),
                    },
                })
            }
        }
    }
    Ok(out)
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fragment())
    }
}
