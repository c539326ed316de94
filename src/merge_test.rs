use serde_json::json;

use super::*;

#[test]
fn candidate_fields_win_and_others_are_kept() {
    let merged = shallow_merge(json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4}));
    assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
}

#[test]
fn nested_objects_are_replaced_not_deep_merged() {
    let merged = shallow_merge(json!({"a": 1, "b": {"x": 1}}), json!({"b": {"y": 2}}));
    assert_eq!(merged, json!({"a": 1, "b": {"y": 2}}));
}

#[test]
fn empty_candidate_leaves_current_unchanged() {
    let current = json!({"a": 1});
    assert_eq!(shallow_merge(current.clone(), json!({})), current);
}

#[test]
fn explicit_null_overwrites_field() {
    let merged = shallow_merge(json!({"a": 1}), json!({"a": null}));
    assert_eq!(merged, json!({"a": null}));
}

#[test]
fn non_object_candidate_replaces_current() {
    assert_eq!(shallow_merge(json!({"a": 1}), json!([1, 2])), json!([1, 2]));
}

#[test]
fn non_object_current_is_replaced_by_candidate() {
    assert_eq!(shallow_merge(json!(7), json!({"a": 1})), json!({"a": 1}));
}
