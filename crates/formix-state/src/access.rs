//! Path-addressed reads and writes over nested JSON documents.
//!
//! Reads never fail: any miss along the way (missing key, out-of-bounds index,
//! key lookup on a sequence, descent into a scalar) yields `None`. Writes
//! create the containers they need, choosing the container kind from the
//! segment that will address into it.

use crate::{
    error::{value_type_name, StateError, StateResult},
    Path, Seg,
};
use serde_json::{Map, Value};

/// Get a reference to a value at a path (for reading).
///
/// Index segments applied to a mapping look up the decimal key, so
/// `{"0": "x"}` is reachable through `"0"` and `"[0]"` alike.
///
/// # Examples
///
/// ```
/// use formix_state::{get_at_path, parse_path};
/// use serde_json::json;
///
/// let doc = json!({"a": [{"b": 1}]});
/// assert_eq!(get_at_path(&doc, &parse_path("a[0].b")), Some(&json!(1)));
/// assert_eq!(get_at_path(&doc, &parse_path("a.b")), None);
/// ```
pub fn get_at_path<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = doc;
    for seg in path.segments() {
        current = match (current, seg) {
            (Value::Object(map), Seg::Key(key)) => map.get(key)?,
            (Value::Object(map), Seg::Index(idx)) => map.get(&idx.to_string())?,
            (Value::Array(arr), Seg::Index(idx)) => arr.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a mutable reference to a value at a path.
pub fn get_at_path_mut<'a>(doc: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = doc;
    for seg in path.segments() {
        current = match (current, seg) {
            (Value::Object(map), Seg::Key(key)) => map.get_mut(key)?,
            (Value::Object(map), Seg::Index(idx)) => map.get_mut(&idx.to_string())?,
            (Value::Array(arr), Seg::Index(idx)) => arr.get_mut(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set a value at a path, creating intermediate containers as needed.
///
/// The final segment is overwritten, never merged. Missing intermediates are
/// created as a sequence when the segment that addresses into them is an
/// index and as a mapping otherwise; `null` and scalar intermediates are
/// replaced the same way.
///
/// Sequences are never padded. An index at or past the end of a sequence
/// appends one new element, so writing `a[5]` into a two-element sequence
/// lands at `a[2]` and `a[5]` keeps reading as absent. A key segment that
/// addresses an existing sequence leaves the sequence untouched and drops the
/// write.
///
/// Returns whether the value was written.
///
/// # Examples
///
/// ```
/// use formix_state::{parse_path, set_at_path};
/// use serde_json::json;
///
/// let mut doc = json!({});
/// assert!(set_at_path(&mut doc, &parse_path("a[0]"), json!(1)));
/// assert!(set_at_path(&mut doc, &parse_path("b.c"), json!(2)));
/// assert_eq!(doc, json!({"a": [1], "b": {"c": 2}}));
///
/// assert!(!set_at_path(&mut doc, &parse_path("a.name"), json!(3)));
/// assert_eq!(doc["a"], json!([1]));
/// ```
pub fn set_at_path(doc: &mut Value, path: &Path, value: Value) -> bool {
    let Some((last, parents)) = path.segments().split_last() else {
        *doc = value;
        return true;
    };

    let mut current = doc;
    for seg in parents {
        current = match slot_mut(current, seg) {
            Some(next) => next,
            None => return false,
        };
    }
    match slot_mut(current, last) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Resolve the child slot addressed by `seg`, making `current` a container
/// that can hold it first.
///
/// `None` when `current` is a sequence and `seg` a key.
fn slot_mut<'a>(current: &'a mut Value, seg: &Seg) -> Option<&'a mut Value> {
    if !current.is_object() && !current.is_array() {
        *current = empty_container_for(seg);
    }
    match (current, seg) {
        (Value::Object(map), Seg::Key(key)) => Some(map.entry(key.clone()).or_insert(Value::Null)),
        (Value::Object(map), Seg::Index(idx)) => {
            Some(map.entry(idx.to_string()).or_insert(Value::Null))
        }
        (Value::Array(arr), Seg::Index(idx)) => {
            if *idx >= arr.len() {
                arr.push(Value::Null);
                return arr.last_mut();
            }
            arr.get_mut(*idx)
        }
        _ => None,
    }
}

fn empty_container_for(seg: &Seg) -> Value {
    if seg.is_index() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Delete the value at `path`, returning it (no-op if the path doesn't exist).
///
/// Deleting a sequence element shifts the following elements down. Deleting
/// the root path resets the document to `null`.
pub fn delete_at_path(doc: &mut Value, path: &Path) -> Option<Value> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Some(std::mem::take(doc));
    };
    let parent = get_at_path_mut(doc, &Path::from_segments(parents.to_vec()))?;
    match (parent, last) {
        (Value::Object(map), Seg::Key(key)) => map.remove(key),
        (Value::Object(map), Seg::Index(idx)) => map.remove(&idx.to_string()),
        (Value::Array(arr), Seg::Index(idx)) => (*idx < arr.len()).then(|| arr.remove(*idx)),
        _ => None,
    }
}

/// Append an item to the sequence at `path`.
///
/// A missing or `null` target becomes a one-element sequence. Returns the new
/// length of the sequence. A target that cannot be created (a key below an
/// existing sequence) is reported as [`StateError::AppendRequiresArray`].
pub fn append_at_path(doc: &mut Value, path: &Path, item: Value) -> StateResult<usize> {
    if let Some(target) = get_at_path_mut(doc, path) {
        match target {
            Value::Array(arr) => {
                arr.push(item);
                return Ok(arr.len());
            }
            Value::Null => {}
            _ => return Err(StateError::append_requires_array(path.clone())),
        }
    }

    if set_at_path(doc, path, Value::Array(vec![item])) {
        Ok(1)
    } else {
        Err(StateError::append_requires_array(path.clone()))
    }
}

/// Remove the element at `index` from the sequence at `path`.
///
/// Returns the removed element. An out-of-range index or a missing target is
/// a no-op returning `Ok(None)`.
pub fn remove_index_at_path(
    doc: &mut Value,
    path: &Path,
    index: usize,
) -> StateResult<Option<Value>> {
    match get_at_path_mut(doc, path) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(arr)) => Ok((index < arr.len()).then(|| arr.remove(index))),
        Some(other) => Err(StateError::type_mismatch(
            path.clone(),
            "array",
            value_type_name(other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_path, path};
    use serde_json::json;

    fn get<'a>(doc: &'a Value, expr: &str) -> Option<&'a Value> {
        get_at_path(doc, &parse_path(expr))
    }

    fn set(doc: &mut Value, expr: &str, value: Value) -> bool {
        set_at_path(doc, &parse_path(expr), value)
    }

    #[test]
    fn test_get_first_level() {
        let doc = json!({"a": 1, "b": 2});
        assert_eq!(get(&doc, "a"), Some(&json!(1)));
        assert_eq!(get(&doc, "b"), Some(&json!(2)));
    }

    #[test]
    fn test_get_nested() {
        let doc = json!({"a": {"b": {"c": 1}}});
        assert_eq!(get(&doc, "a.b.c"), Some(&json!(1)));
    }

    #[test]
    fn test_get_with_array_indexes() {
        let doc = json!({"a": [{"b": 1}, {"c": 2}]});
        assert_eq!(get(&doc, "a[0].b"), Some(&json!(1)));
        assert_eq!(get(&doc, "a.0.b"), Some(&json!(1)));
        assert_eq!(get(&doc, "a[1].c"), Some(&json!(2)));
        assert_eq!(get(&doc, "a.1.c"), Some(&json!(2)));
    }

    #[test]
    fn test_get_key_on_array_is_absent() {
        let doc = json!({"a": [1]});
        assert_eq!(get(&doc, "a.b"), None);
    }

    #[test]
    fn test_get_out_of_bounds_is_absent() {
        let doc = json!({"a": [1], "e": []});
        assert_eq!(get(&doc, "a.1"), None);
        assert_eq!(get(&doc, "e[0]"), None);
    }

    #[test]
    fn test_get_missing_key_is_absent() {
        let doc = json!({});
        assert_eq!(get(&doc, "a.b"), None);
    }

    #[test]
    fn test_get_through_scalar_is_absent() {
        let doc = json!({"a": 5, "n": null});
        assert_eq!(get(&doc, "a.b"), None);
        assert_eq!(get(&doc, "n.b"), None);
        assert_eq!(get(&doc, "n"), Some(&Value::Null));
    }

    #[test]
    fn test_get_index_on_object_reads_decimal_key() {
        let doc = json!({"m": {"0": "zero"}});
        assert_eq!(get(&doc, "m.0"), Some(&json!("zero")));
        assert_eq!(get(&doc, "m[0]"), Some(&json!("zero")));
    }

    #[test]
    fn test_get_root_path_returns_document() {
        let doc = json!({"a": 1});
        assert_eq!(get_at_path(&doc, &Path::root()), Some(&doc));
    }

    #[test]
    fn test_set_first_level() {
        let mut doc = json!({"a": 1, "b": 2});
        set(&mut doc, "a", json!(3));
        set(&mut doc, "b", json!(4));
        assert_eq!(doc, json!({"a": 3, "b": 4}));
    }

    #[test]
    fn test_set_nested() {
        let mut doc = json!({"a": {"b": {"c": 1}}});
        set(&mut doc, "a.b.c", json!(2));
        assert_eq!(doc["a"]["b"]["c"], 2);
    }

    #[test]
    fn test_set_with_array_indexes() {
        let mut doc = json!({"a": [{"b": 1}, {"c": 2}]});

        set(&mut doc, "a[0].b", json!(3));
        assert_eq!(doc, json!({"a": [{"b": 3}, {"c": 2}]}));

        set(&mut doc, "a.0.b", json!(4));
        set(&mut doc, "a[1].c", json!(5));
        assert_eq!(doc, json!({"a": [{"b": 4}, {"c": 5}]}));

        set(&mut doc, "a.1.c", json!(6));
        assert_eq!(doc, json!({"a": [{"b": 4}, {"c": 6}]}));
    }

    #[test]
    fn test_set_past_end_appends_without_padding() {
        let mut doc = json!({"a": [1]});
        assert!(set_at_path(&mut doc, &parse_path("a.3"), json!(9)));
        assert_eq!(doc, json!({"a": [1, 9]}));
        assert_eq!(get(&doc, "a.3"), None);
        assert_eq!(get(&doc, "a.2"), None);

        set(&mut doc, "a.7.b", json!(2));
        assert_eq!(doc, json!({"a": [1, 9, {"b": 2}]}));
        assert_eq!(get(&doc, "a[7].b"), None);
        assert_eq!(get(&doc, "a[2].b"), Some(&json!(2)));
    }

    #[test]
    fn test_set_huge_index_does_not_allocate_or_overflow() {
        let mut doc = json!({"a": [1, 2]});
        set_at_path(&mut doc, &parse_path(&format!("a[{}]", usize::MAX)), json!(3));
        set_at_path(&mut doc, &parse_path("a.1000000000000000"), json!(4));
        set_at_path(&mut doc, &path!("b", usize::MAX, "c"), json!(5));
        assert_eq!(doc, json!({"a": [1, 2, 3, 4], "b": [{"c": 5}]}));
    }

    #[test]
    fn test_set_creates_array_for_index() {
        let mut doc = json!({});
        set(&mut doc, "a[0]", json!(1));
        assert_eq!(doc, json!({"a": [1]}));

        set(&mut doc, "a.1", json!(2));
        assert_eq!(doc, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_set_creates_object_for_key() {
        let mut doc = json!({});
        set(&mut doc, "a.b", json!(1));
        assert_eq!(doc, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_set_creates_mixed_intermediates() {
        let mut doc = json!({});
        set(&mut doc, "users[0].tags[0]", json!("b"));
        assert_eq!(doc, json!({"users": [{"tags": ["b"]}]}));
    }

    #[test]
    fn test_set_overwrites_rather_than_merges() {
        let mut doc = json!({"user": {"name": "Alice", "age": 30}});
        set(&mut doc, "user", json!({"name": "Bob"}));
        assert_eq!(doc, json!({"user": {"name": "Bob"}}));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut doc = json!({"a": 5});
        set(&mut doc, "a.b", json!(1));
        assert_eq!(doc, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_set_key_into_array_keeps_array() {
        let mut doc = json!({"a": [1, 2], "e": []});
        assert!(!set_at_path(&mut doc, &parse_path("a.b"), json!(1)));
        assert!(!set_at_path(&mut doc, &parse_path("e.b.c"), json!(1)));
        assert_eq!(doc, json!({"a": [1, 2], "e": []}));
    }

    #[test]
    fn test_set_index_into_object_uses_decimal_key() {
        let mut doc = json!({"m": {}});
        set(&mut doc, "m.0", json!("zero"));
        assert_eq!(doc, json!({"m": {"0": "zero"}}));
    }

    #[test]
    fn test_set_root_path_replaces_document() {
        let mut doc = json!({"a": 1});
        set_at_path(&mut doc, &Path::root(), json!([1, 2]));
        assert_eq!(doc, json!([1, 2]));
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let cases = [
            "a",
            "a.b.c",
            "list[0]",
            "list[0].name",
            "deep.list.0.items[0].value",
            "m.0",
        ];
        for expr in cases {
            let mut doc = json!({});
            set(&mut doc, expr, json!({"marker": expr}));
            assert_eq!(get(&doc, expr), Some(&json!({"marker": expr})), "{expr}");
        }
    }

    #[test]
    fn test_delete_existing_and_missing() {
        let mut doc = json!({"a": {"b": 1, "c": 2}, "arr": [1, 2, 3]});
        assert_eq!(delete_at_path(&mut doc, &parse_path("a.b")), Some(json!(1)));
        assert_eq!(delete_at_path(&mut doc, &parse_path("arr[1]")), Some(json!(2)));
        assert_eq!(delete_at_path(&mut doc, &parse_path("a.zzz")), None);
        assert_eq!(delete_at_path(&mut doc, &parse_path("arr.x")), None);
        assert_eq!(doc, json!({"a": {"c": 2}, "arr": [1, 3]}));
    }

    #[test]
    fn test_append_existing_array() {
        let mut doc = json!({"items": [1, 2]});
        let len = append_at_path(&mut doc, &path!("items"), json!(3)).unwrap();
        assert_eq!(len, 3);
        assert_eq!(doc["items"], json!([1, 2, 3]));
    }

    #[test]
    fn test_append_creates_array() {
        let mut doc = json!({"n": null});
        append_at_path(&mut doc, &path!("items"), json!(1)).unwrap();
        append_at_path(&mut doc, &path!("n"), json!(2)).unwrap();
        assert_eq!(doc, json!({"items": [1], "n": [2]}));
    }

    #[test]
    fn test_append_below_array_key_is_rejected() {
        let mut doc = json!({"rows": [1]});
        let err = append_at_path(&mut doc, &path!("rows", "tags"), json!("x")).unwrap_err();
        assert!(matches!(err, StateError::AppendRequiresArray { .. }));
        assert_eq!(doc, json!({"rows": [1]}));
    }

    #[test]
    fn test_append_rejects_non_array() {
        let mut doc = json!({"name": "x"});
        let err = append_at_path(&mut doc, &path!("name"), json!(1)).unwrap_err();
        assert!(matches!(err, StateError::AppendRequiresArray { .. }));
        assert_eq!(doc, json!({"name": "x"}));
    }

    #[test]
    fn test_remove_index() {
        let mut doc = json!({"b": [10, 20, 30]});
        let removed = remove_index_at_path(&mut doc, &path!("b"), 0).unwrap();
        assert_eq!(removed, Some(json!(10)));
        assert_eq!(doc["b"], json!([20, 30]));
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut doc = json!({"b": [10]});
        assert_eq!(remove_index_at_path(&mut doc, &path!("b"), 5).unwrap(), None);
        assert_eq!(remove_index_at_path(&mut doc, &path!("missing"), 0).unwrap(), None);
        assert_eq!(doc, json!({"b": [10]}));
    }

    #[test]
    fn test_remove_rejects_non_array() {
        let mut doc = json!({"b": {"x": 1}});
        let err = remove_index_at_path(&mut doc, &path!("b"), 0).unwrap_err();
        assert!(matches!(
            err,
            StateError::TypeMismatch {
                expected: "array",
                found: "object",
                ..
            }
        ));
    }
}
