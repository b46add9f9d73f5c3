//! Relative-reference resolution
//!
//! A reference string takes one of three forms, split on the first `#`:
//! 1. `locator` - a resource to load, yielding its root
//! 2. `#fragment` - a pointer into the current resource's document
//! 3. `locator#fragment` - both: load the resource, then descend
//!
//! Locators are resolved against the base reference's location per
//! RFC3986 and fetched through the loader's cache; fragments are decoded
//! as URI-fragment pointers and applied token by token, so a failure can
//! report the deepest node that was actually reached.

use std::sync::Arc;

use tracing::debug;

use crate::document::Document;
use crate::error::{ResolveError, Result};
use crate::loader::DocumentLoader;
use crate::pointer::Pointer;
use crate::reference::Reference;

/// Resolve a relative reference string against a current reference
///
/// Fragment-only references apply to the base document's *root*, not to
/// the node `base` currently points at.
pub fn resolve(loader: &mut DocumentLoader, base: &Reference, reference: &str) -> Result<Reference> {
    debug!(base = %base, reference, "resolving reference");
    match reference.find('#') {
        None => {
            let location = loader.opener().resolve_against(base.location(), reference)?;
            let doc = loader.load(&location)?;
            Ok(Reference::root(doc))
        }
        Some(0) => {
            let pointer = Pointer::from_fragment(&reference[1..])?;
            apply_fragment(base.document().clone(), pointer)
        }
        Some(position) => {
            let location = loader
                .opener()
                .resolve_against(base.location(), &reference[..position])?;
            let doc = loader.load(&location)?;
            let pointer = Pointer::from_fragment(&reference[position + 1..])?;
            apply_fragment(doc, pointer)
        }
    }
}

/// Walk a decoded pointer into a document, wrapping any lookup failure
/// as `ReferenceResolution` with the deepest reference reached
fn apply_fragment(doc: Arc<Document>, pointer: Pointer) -> Result<Reference> {
    let mut current = Reference::root(doc);
    for token in pointer.tokens() {
        current = match current.child(token) {
            Ok(next) => next,
            Err(err) => {
                return Err(ResolveError::ReferenceResolution {
                    message: err.to_string(),
                    partial: Some(current),
                    source: Box::new(err),
                })
            }
        };
    }
    Ok(current)
}
