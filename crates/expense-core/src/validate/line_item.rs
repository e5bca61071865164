//! Validation of line items and line item groups.

use std::collections::HashMap;

use serde_json::Value;
use tracing::trace;

use crate::error::ValidationErrorKind;
use crate::models::expense::{Field, LineItem, LineItemGroup};

use super::keys::{LINE_ITEMS, LINE_ITEM_EXPENSE_FIELDS, LINE_ITEM_GROUP_INDEX};
use super::{FieldPath, Validate, Validator};

impl Validate for LineItem {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        let record = v.object(value, path)?;
        let fields = v.required_field(record, LINE_ITEM_EXPENSE_FIELDS, path, Vec::<Field>::validate)?;
        Some(LineItem::new(fields))
    }
}

impl Validate for LineItemGroup {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        trace!(%path, "validating line item group");
        let record = v.object(value, path)?;

        let index = v.required_field(record, LINE_ITEM_GROUP_INDEX, path, Validator::index);
        let line_items = v.required_field(record, LINE_ITEMS, path, Vec::<LineItem>::validate);

        Some(LineItemGroup::new(index?, line_items?))
    }
}

/// Check that no two groups in `groups` share a `LineItemGroupIndex`.
///
/// Runs over the raw records so that indices of groups that failed
/// validation elsewhere still take part. Malformed indices are skipped here;
/// the group validator reports them. Returns `false` if a duplicate was found.
pub(crate) fn check_unique_group_indices(
    v: &mut Validator,
    groups: &[Value],
    path: &FieldPath,
) -> bool {
    let index_path = |position: usize| path.index(position).key(LINE_ITEM_GROUP_INDEX);
    let mut first_seen: HashMap<u32, usize> = HashMap::new();
    let mut unique = true;

    for (position, group) in groups.iter().enumerate() {
        let Some(index) = group
            .get(LINE_ITEM_GROUP_INDEX)
            .and_then(Value::as_u64)
            .and_then(|i| u32::try_from(i).ok())
        else {
            continue;
        };

        match first_seen.get(&index) {
            Some(&first) => {
                unique = false;
                v.report(
                    index_path(position),
                    ValidationErrorKind::DuplicateIndex {
                        index,
                        first: index_path(first),
                    },
                );
            }
            None => {
                first_seen.insert(index, position);
            }
        }
    }

    unique
}
