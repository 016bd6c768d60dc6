//! Multi-field fan-out.
//!
//! Projects a single per-field callback across a field list and produces an
//! id-indexed result map, resolving each field's owning item type from the
//! live index on the base context.

use std::collections::HashMap;

use crate::context::BaseCtx;
use crate::model::{Field, ItemType};

/// Per-field view handed to a fan-out callback: the base context plus the
/// field's resolved owning item type.
#[derive(Debug)]
pub struct FieldHookCtx<'a> {
    pub base: &'a BaseCtx,
    pub item_type: &'a ItemType,
}

/// Project `hook` across `fields`, keyed by field id.
///
/// An absent hook (the author did not implement it) yields an empty map. A
/// field whose `item_type_id` is missing from the index is skipped with a
/// warning; one stale field reference must not fail the rest of the batch.
/// No ordering guarantee is given.
pub fn fan_out<T, F>(hook: Option<&F>, fields: &[Field], base: &BaseCtx) -> HashMap<String, T>
where
    F: Fn(&Field, &FieldHookCtx<'_>) -> T,
{
    let Some(hook) = hook else {
        return HashMap::new();
    };

    let mut results = HashMap::with_capacity(fields.len());
    for field in fields {
        let Some(item_type) = base.state.item_types.get(&field.item_type_id) else {
            tracing::warn!(
                field_id = %field.id,
                item_type_id = %field.item_type_id,
                "skipping field with unknown item type",
            );
            continue;
        };
        let ctx = FieldHookCtx { base, item_type };
        results.insert(field.id.clone(), hook(field, &ctx));
    }
    results
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;
    use crate::host::test_support::RecordingCaller;
    use crate::host::HostHandle;
    use crate::model::HostState;

    fn base_with_item_types(ids: &[&str]) -> BaseCtx {
        let mut item_types = StdHashMap::new();
        for id in ids {
            item_types.insert(
                (*id).to_string(),
                ItemType {
                    id: (*id).to_string(),
                    name: format!("type {id}"),
                    ..ItemType::default()
                },
            );
        }
        BaseCtx {
            host: HostHandle::new(Arc::new(RecordingCaller::new())),
            state: HostState {
                item_types,
                ..HostState::default()
            },
        }
    }

    fn field(id: &str, item_type_id: &str) -> Field {
        Field {
            id: id.to_string(),
            item_type_id: item_type_id.to_string(),
            ..Field::default()
        }
    }

    #[test]
    fn absent_hook_returns_empty_map() {
        let base = base_with_item_types(&["it-1"]);
        let fields = vec![field("f-1", "it-1")];
        let hook: Option<&fn(&Field, &FieldHookCtx<'_>) -> Value> = None;
        let results = fan_out(hook, &fields, &base);
        assert!(results.is_empty());
    }

    #[test]
    fn results_are_keyed_by_field_id() {
        let base = base_with_item_types(&["it-1", "it-2"]);
        let fields = vec![field("f-1", "it-1"), field("f-2", "it-2")];

        let hook = |field: &Field, ctx: &FieldHookCtx<'_>| {
            format!("{}:{}", field.id, ctx.item_type.name)
        };
        let results = fan_out(Some(&hook), &fields, &base);

        assert_eq!(results.len(), 2);
        assert_eq!(results["f-1"], "f-1:type it-1");
        assert_eq!(results["f-2"], "f-2:type it-2");
    }

    #[test]
    fn orphan_fields_are_skipped() {
        let base = base_with_item_types(&["it-1"]);
        let fields = vec![field("f-1", "it-1"), field("f-orphan", "it-gone")];

        let hook = |field: &Field, _ctx: &FieldHookCtx<'_>| field.id.clone();
        let results = fan_out(Some(&hook), &fields, &base);

        assert_eq!(results.len(), 1);
        assert!(results.contains_key("f-1"));
        assert!(!results.contains_key("f-orphan"));
    }
}
