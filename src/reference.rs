//! References: immutable (resource, pointer) pairs with typed navigation
//!
//! A `Reference` names one node in one document. Every navigation operation
//! returns a new derived `Reference` and performs no I/O; crossing into
//! another document is the resolver's job.
//!
//! Typed accessors compare the target node's tag against an [`Expect`]
//! descriptor and report mismatches with the exact failing location, so a
//! caller can render `file:///cfg.yaml#/jobs/3/name: expected String,
//! found 42` without re-walking anything.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Value;

use crate::document::Document;
use crate::error::{ResolveError, Result};
use crate::pointer::Pointer;
use crate::tree::{Expect, NodeKind};

/// An immutable pair of document and pointer naming a single node
#[derive(Clone, Debug)]
pub struct Reference {
    doc: Arc<Document>,
    pointer: Pointer,
}

impl Reference {
    /// Reference to the root of a document
    pub fn root(doc: Arc<Document>) -> Reference {
        Reference {
            doc,
            pointer: Pointer::root(),
        }
    }

    pub fn new(doc: Arc<Document>, pointer: Pointer) -> Reference {
        Reference { doc, pointer }
    }

    pub fn location(&self) -> &str {
        self.doc.location()
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    /// The node this reference points at
    ///
    /// Walks the pointer from the document root. Fails with `NotFound` when
    /// a token misses (absent key, index out of range, descent into a
    /// scalar) or `PointerSyntax` when a non-numeric token is applied to an
    /// array; messages carry the full `location#pointer` path.
    pub fn value(&self) -> Result<&Value> {
        let tokens = self.pointer.tokens();
        let mut node = self.doc.root();
        for depth in 0..tokens.len() {
            node = step(&self.doc, tokens, depth, node)?;
        }
        Ok(node)
    }

    // =========================================================================
    // SINGLE-STEP NAVIGATION
    // =========================================================================

    /// Descend one level without any type check
    ///
    /// The key must exist (objects) or the index must be in range (arrays);
    /// descending into any other kind is a `NotFound`.
    pub fn child(&self, token: impl AsRef<str>) -> Result<Reference> {
        let child = Reference {
            doc: self.doc.clone(),
            pointer: self.pointer.push(token.as_ref()),
        };
        child.value()?;
        Ok(child)
    }

    /// Descend one level and require the child to match `expect`
    pub fn child_typed(&self, token: impl AsRef<str>, expect: Expect) -> Result<Reference> {
        let child = self.child(token)?;
        child.check_type("Child", expect)?;
        Ok(child)
    }

    /// Ascend one level; fails on the root
    pub fn parent(&self) -> Result<Reference> {
        let pointer = self.pointer.parent().ok_or_else(|| ResolveError::NotFound {
            message: format!("can't get parent of root at {self}"),
        })?;
        Ok(Reference {
            doc: self.doc.clone(),
            pointer,
        })
    }

    /// Ascend one level and require the parent node to match `expect`
    pub fn parent_typed(&self, expect: Expect) -> Result<Reference> {
        let parent = self.parent()?;
        parent.check_type("Parent", expect)?;
        Ok(parent)
    }

    /// Existence-and-type probe; never fails
    ///
    /// True iff the child exists and matches `expect` — including a present
    /// key holding Null when `expect` is nullable.
    pub fn has_child(&self, token: impl AsRef<str>, expect: Expect) -> bool {
        match self.child(token) {
            Ok(child) => child.value().map(|v| expect.matches(v)).unwrap_or(false),
            Err(_) => false,
        }
    }

    fn check_type(&self, role: &'static str, expect: Expect) -> Result<()> {
        let actual = self.value()?;
        if expect.matches(actual) {
            return Ok(());
        }
        Err(ResolveError::TypeMismatch {
            role,
            expected: expect,
            actual: actual.clone(),
            reference: self.clone(),
        })
    }

    // =========================================================================
    // BULK NAVIGATION
    // =========================================================================

    /// Child tokens of a container node, in document order
    fn element_tokens(&self) -> Result<Vec<String>> {
        match self.value()? {
            Value::Array(items) => Ok((0..items.len()).map(|i| i.to_string()).collect()),
            Value::Object(object) => Ok(object.keys().cloned().collect()),
            other => Err(ResolveError::NotFound {
                message: format!("cannot iterate {} at {self}", NodeKind::of(other)),
            }),
        }
    }

    /// Apply `f` to every element, requiring each to match `expect`
    ///
    /// Elements are visited in document order; the first element failing
    /// the type check aborts with exactly the `TypeMismatch` that
    /// [`child_typed`](Self::child_typed) would have produced for it.
    pub fn map<T>(
        &self,
        expect: Expect,
        mut f: impl FnMut(&Reference) -> Result<T>,
    ) -> Result<Vec<T>> {
        let tokens = self.element_tokens()?;
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            let element = self.child_typed(&token, expect)?;
            out.push(f(&element)?);
        }
        Ok(out)
    }

    /// True if `pred` holds for any element; short-circuits
    pub fn any(
        &self,
        expect: Expect,
        mut pred: impl FnMut(&Reference) -> Result<bool>,
    ) -> Result<bool> {
        for token in self.element_tokens()? {
            let element = self.child_typed(&token, expect)?;
            if pred(&element)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if `pred` holds for every element; short-circuits
    pub fn all(
        &self,
        expect: Expect,
        mut pred: impl FnMut(&Reference) -> Result<bool>,
    ) -> Result<bool> {
        for token in self.element_tokens()? {
            let element = self.child_typed(&token, expect)?;
            if !pred(&element)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn for_each(
        &self,
        expect: Expect,
        mut f: impl FnMut(&Reference) -> Result<()>,
    ) -> Result<()> {
        for token in self.element_tokens()? {
            let element = self.child_typed(&token, expect)?;
            f(&element)?;
        }
        Ok(())
    }

    /// Like [`for_each`](Self::for_each) but also passes the member key
    /// (arrays pass the decimal index)
    pub fn for_each_key(
        &self,
        expect: Expect,
        mut f: impl FnMut(&str, &Reference) -> Result<()>,
    ) -> Result<()> {
        for token in self.element_tokens()? {
            let element = self.child_typed(&token, expect)?;
            f(&token, &element)?;
        }
        Ok(())
    }
}

fn step<'a>(
    doc: &Document,
    tokens: &[String],
    depth: usize,
    node: &'a Value,
) -> Result<&'a Value> {
    let token = &tokens[depth];
    let path = || {
        format!(
            "{}#{}",
            doc.location(),
            Pointer::from_tokens(&tokens[..=depth]).to_fragment()
        )
    };
    match node {
        Value::Object(object) => object.get(token).ok_or_else(|| ResolveError::NotFound {
            message: format!("no member '{token}' at {}", path()),
        }),
        Value::Array(items) => {
            let index: usize = match token.parse() {
                Ok(index) => index,
                // numeric but overflowing usize is out of range, not a
                // syntax error
                Err(_) if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) => {
                    return Err(ResolveError::NotFound {
                        message: format!(
                            "array index {token} out of range (length {}) at {}",
                            items.len(),
                            path()
                        ),
                    })
                }
                Err(_) => {
                    return Err(ResolveError::PointerSyntax {
                        message: format!("array index '{token}' is not a number at {}", path()),
                    })
                }
            };
            items.get(index).ok_or_else(|| ResolveError::NotFound {
                message: format!(
                    "array index {index} out of range (length {}) at {}",
                    items.len(),
                    path()
                ),
            })
        }
        other => Err(ResolveError::NotFound {
            message: format!("cannot descend into {} at {}", NodeKind::of(other), path()),
        }),
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Reference) -> bool {
        self.doc.location() == other.doc.location() && self.pointer == other.pointer
    }
}

impl Eq for Reference {}

impl Hash for Reference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.doc.location().hash(state);
        self.pointer.hash(state);
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.doc.location(), self.pointer.to_fragment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixture() -> Reference {
        let doc = Document::new(
            "file:///fixture.json",
            json!({
                "alpha": 123,
                "delta": "A string",
                "maybe": null,
                "list": [1, 2, "x"],
                "nested": {"inner": {"deep": true}}
            }),
        );
        Reference::root(Arc::new(doc))
    }

    #[test]
    fn typed_child_accepts_matching_kind() {
        let root = fixture();
        let alpha = root.child_typed("alpha", Expect::NUMBER).unwrap();
        assert_eq!(alpha.value().unwrap(), &json!(123));
        assert_eq!(alpha.to_string(), "file:///fixture.json#/alpha");
    }

    #[test]
    fn typed_child_reports_mismatch_location() {
        let root = fixture();
        let err = root.child_typed("alpha", Expect::STRING).unwrap_err();
        match err {
            ResolveError::TypeMismatch {
                role,
                expected,
                actual,
                reference,
            } => {
                assert_eq!(role, "Child");
                assert_eq!(expected, Expect::STRING);
                assert_eq!(actual, json!(123));
                assert_eq!(reference.to_string(), "file:///fixture.json#/alpha");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_member_is_not_found_with_full_path() {
        let root = fixture();
        let err = root.child("missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "no member 'missing' at file:///fixture.json#/missing"
        );
    }

    #[test]
    fn array_navigation_checks_bounds_and_syntax() {
        let root = fixture();
        let list = root.child("list").unwrap();
        assert_eq!(list.child("1").unwrap().value().unwrap(), &json!(2));

        let err = list.child("9").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
        assert!(err.to_string().contains("out of range"));

        let err = list.child("first").unwrap_err();
        assert!(matches!(err, ResolveError::PointerSyntax { .. }));

        // numeric but beyond usize: out of range, not a syntax error
        let err = list.child("99999999999999999999999").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn descending_into_scalar_is_not_found() {
        let root = fixture();
        let err = root.child("alpha").unwrap().child("x").unwrap_err();
        assert!(err.to_string().contains("cannot descend into Number"));
    }

    #[test]
    fn parent_walks_back_up_and_fails_on_root() {
        let root = fixture();
        let deep = root
            .child("nested")
            .unwrap()
            .child("inner")
            .unwrap()
            .child("deep")
            .unwrap();
        let inner = deep.parent().unwrap();
        assert_eq!(inner.to_string(), "file:///fixture.json#/nested/inner");
        let back = inner.parent_typed(Expect::OBJECT).unwrap();
        assert_eq!(back, root.child("nested").unwrap());

        let err = root.parent().unwrap_err();
        assert!(err.to_string().contains("can't get parent of root"));
    }

    #[test]
    fn has_child_probe_never_fails() {
        let root = fixture();
        assert!(root.has_child("alpha", Expect::NUMBER));
        assert!(!root.has_child("alpha", Expect::STRING));
        assert!(!root.has_child("missing", Expect::NUMBER));

        // present key holding null: only nullable expectations accept it
        assert!(!root.has_child("maybe", Expect::STRING));
        assert!(root.has_child("maybe", Expect::nullable(NodeKind::String)));
    }

    #[test]
    fn map_fails_like_manual_iteration_would() {
        let root = fixture();
        let list = root.child("list").unwrap();
        let bulk_err = list
            .map(Expect::NUMBER, |e| Ok(e.value()?.clone()))
            .unwrap_err();
        let manual_err = list.child_typed("2", Expect::NUMBER).unwrap_err();
        assert_eq!(bulk_err.to_string(), manual_err.to_string());
    }

    #[test]
    fn map_collects_in_document_order() {
        let root = fixture();
        let names: Vec<String> = root
            .child("nested")
            .unwrap()
            .map(Expect::OBJECT, |e| Ok(e.pointer().to_fragment()))
            .unwrap();
        assert_eq!(names, vec!["/nested/inner"]);
    }

    #[test]
    fn any_and_all_short_circuit() {
        let doc = Document::new("file:///nums.json", json!([1, 2, 3]));
        let root = Reference::root(Arc::new(doc));
        assert!(root
            .any(Expect::NUMBER, |e| Ok(e.value()?.as_i64() == Some(2)))
            .unwrap());
        assert!(!root
            .all(Expect::NUMBER, |e| Ok(e.value()?.as_i64().unwrap() < 3))
            .unwrap());
    }

    #[test]
    fn for_each_key_passes_member_keys_in_order() {
        let doc = Document::new("file:///o.json", json!({"b": 1, "a": 2}));
        let root = Reference::root(Arc::new(doc));
        let mut seen = Vec::new();
        root.for_each_key(Expect::NUMBER, |key, element| {
            seen.push((key.to_string(), element.value()?.clone()));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![("b".into(), json!(1)), ("a".into(), json!(2))]);
    }

    #[test]
    fn iterating_a_scalar_is_not_found() {
        let root = fixture();
        let err = root
            .child("delta")
            .unwrap()
            .for_each(Expect::STRING, |_| Ok(()))
            .unwrap_err();
        assert!(err.to_string().contains("cannot iterate String"));
    }

    #[test]
    fn equality_is_location_plus_pointer() {
        let a = fixture();
        let b = fixture();
        assert_eq!(a, b);
        assert_eq!(a.child("alpha").unwrap(), b.child("alpha").unwrap());
        assert_ne!(a, a.child("alpha").unwrap());

        let other = Reference::root(Arc::new(Document::new(
            "file:///other.json",
            json!({"alpha": 123}),
        )));
        assert_ne!(a, other);
    }

    #[test]
    fn root_reference_displays_trailing_hash() {
        assert_eq!(fixture().to_string(), "file:///fixture.json#");
    }
}
