use serde_json::Value;

/// Merge `patch` into `target`.
///
/// Where both sides are objects, keys are merged recursively and keys absent
/// from the patch survive. Anything else in the patch replaces the target
/// value outright, arrays included.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_siblings_survive() {
        let mut target = json!({"a": {"x": 0, "y": 2}});
        deep_merge(&mut target, &json!({"a": {"x": 1}}));
        assert_eq!(target, json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_nested_levels() {
        let mut target = json!({"a": {"b": {"c": 1, "d": 2}, "e": 3}});
        deep_merge(&mut target, &json!({"a": {"b": {"d": 20, "f": 4}}}));
        assert_eq!(target, json!({"a": {"b": {"c": 1, "d": 20, "f": 4}, "e": 3}}));
    }

    #[test]
    fn test_leaves_replace() {
        let mut target = json!({"list": [1, 2, 3], "obj": {"k": 1}, "n": 1});
        deep_merge(&mut target, &json!({"list": [9], "obj": 5, "n": {"now": "object"}}));
        assert_eq!(target, json!({"list": [9], "obj": 5, "n": {"now": "object"}}));
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let original = json!({"a": {"x": 0}, "b": [1]});
        let mut target = original.clone();
        deep_merge(&mut target, &json!({}));
        assert_eq!(target, original);
    }

    fn shallow_object() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-d]", any::<i32>(), 0..4)
            .prop_map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(base in shallow_object(), patch in shallow_object()) {
            let mut once = json!({"nested": base.clone()});
            deep_merge(&mut once, &json!({"nested": patch.clone()}));
            let mut twice = once.clone();
            deep_merge(&mut twice, &json!({"nested": patch}));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_untouched_keys_survive(base in shallow_object(), patch in shallow_object()) {
            let mut merged = base.clone();
            deep_merge(&mut merged, &patch);
            for (key, value) in base.as_object().into_iter().flatten() {
                if patch.get(key).is_none() {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }
    }
}
