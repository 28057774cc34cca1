//! Path fragments locating an object inside a resource.
//!
//! `/2` is the third root; `/0/@books.1/@cover` walks from the first root
//! through the second element of its `books` list to its `cover`.

use crate::object::{same_object, EObjectRef};
use crate::Value;

pub(crate) fn path_fragment(roots: &[EObjectRef], object: &EObjectRef) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = object.clone();
    while let Some(container) = current.e_container() {
        let feature_id = current.e_container_feature_id()?;
        let class = container.e_class();
        let feature = class.feature(feature_id)?;
        if feature.is_many() {
            let items = container.e_get(feature_id);
            let index = items
                .as_list()?
                .iter()
                .position(|v| v.as_object().is_some_and(|o| same_object(o, &current)))?;
            segments.push(format!("@{}.{index}", feature.name()));
        } else {
            segments.push(format!("@{}", feature.name()));
        }
        current = container;
    }
    let root = roots.iter().position(|r| same_object(r, &current))?;
    let mut fragment = format!("/{root}");
    for segment in segments.iter().rev() {
        fragment.push('/');
        fragment.push_str(segment);
    }
    Some(fragment)
}

pub(crate) fn resolve_path(roots: &[EObjectRef], fragment: &str) -> Option<EObjectRef> {
    let mut parts = fragment.strip_prefix('/')?.split('/');
    let root = match parts.next() {
        None | Some("") => 0,
        Some(index) => index.parse().ok()?,
    };
    let mut current = roots.get(root)?.clone();
    for part in parts {
        let segment = part.strip_prefix('@')?;
        let (name, index) = match segment.rsplit_once('.') {
            Some((name, index)) => (name, Some(index.parse::<usize>().ok()?)),
            None => (segment, None),
        };
        let feature_id = current.e_class().feature_id(name)?;
        let next = match (current.e_get(feature_id), index) {
            (Value::List(items), Some(index)) => items.get(index)?.as_object()?.clone(),
            (Value::Object(obj), None) => obj,
            _ => return None,
        };
        current = next;
    }
    Some(current)
}
