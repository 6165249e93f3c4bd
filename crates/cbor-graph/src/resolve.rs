//! Back-reference resolution for decoded value graphs.
//!
//! The decoder leaves tag-29 back-references in the tree as `Tag(29, index)`
//! placeholders. [`resolve_references`] walks the kept table and then the
//! decoded roots, replacing each placeholder slot with the kept value it
//! points at. Substitution happens in place, so after resolution the graph
//! aliases (and may be cyclic).

use std::rc::Rc;

use crate::constants::TAG_SHARED_REF;
use crate::decoder::KeptTable;
use crate::value::{Value, ValueRef};

/// If `value` is a `Tag(29, n)` placeholder, returns the kept index `n`.
fn back_ref(value: &ValueRef) -> Option<usize> {
    if let Value::Tag(TAG_SHARED_REF, inner) = value.as_ref() {
        if let Value::Integer(i) = inner.borrow().as_ref() {
            if *i >= 0 {
                return Some(*i as usize);
            }
        }
    }
    None
}

/// Patches one slot: substitutes a placeholder, or descends into a
/// container. Slots already on the ancestor path are skipped, which keeps
/// the walk finite once earlier substitutions have introduced cycles.
fn visit(
    slot: &mut ValueRef,
    kept: &KeptTable,
    path: &mut Vec<*const Value>,
    remaining: &mut usize,
) {
    let addr = Rc::as_ptr(slot);
    if path.contains(&addr) {
        return;
    }
    if let Some(index) = back_ref(slot) {
        match kept.get(index) {
            Some(Some(target)) => *slot = target.clone(),
            _ => *remaining += 1,
        }
        // a substituted value was decoded complete; nothing to descend into
        return;
    }
    path.push(addr);
    match slot.as_ref() {
        Value::Array(items) | Value::Set(items) => {
            for item in items.borrow_mut().iter_mut() {
                visit(item, kept, path, remaining);
            }
        }
        Value::Map(pairs) => {
            for (key, val) in pairs.borrow_mut().iter_mut() {
                visit(key, kept, path, remaining);
                visit(val, kept, path, remaining);
            }
        }
        Value::Tag(_, inner) => {
            visit(&mut *inner.borrow_mut(), kept, path, remaining);
        }
        _ => {}
    }
    path.pop();
}

/// Resolves every reachable back-reference in `roots`, substituting values
/// from `kept`. The kept table is walked first, so references between kept
/// values resolve regardless of where their marks sat in the stream.
///
/// Returns the number of placeholders that could not be substituted (their
/// index was missing from the table). A non-zero count usually means the
/// stream was decoded piecemeal and more of it is still to come.
pub fn resolve_references(roots: &mut [ValueRef], kept: &mut KeptTable) -> usize {
    let mut remaining = 0;
    for i in 0..kept.len() {
        let Some(mut slot) = kept[i].clone() else {
            continue;
        };
        let mut path = Vec::new();
        visit(&mut slot, kept, &mut path, &mut remaining);
        kept[i] = Some(slot);
    }
    let mut path = Vec::new();
    for root in roots.iter_mut() {
        visit(root, kept, &mut path, &mut remaining);
    }
    remaining
}
