//! Checked payload access shared by the operations.
//!
//! Compiled artifacts trust their input to match the shape they were
//! compiled for; a mismatch is a caller bug and panics with the name of
//! the operation, mirroring how property getters report theirs.

use kata_value::Value;

/// The items of a list value.
///
/// # Panics
///
/// Panics when `value` is not a list.
pub(crate) fn list_items<'v>(operation: &'static str, value: &'v Value) -> &'v [Value] {
    value.as_list().unwrap_or_else(|| {
        panic!(
            "{operation} read from {} value, expected a list",
            value.kind_name()
        )
    })
}

/// The entries of a map value.
///
/// # Panics
///
/// Panics when `value` is not a map.
pub(crate) fn map_entries<'v>(operation: &'static str, value: &'v Value) -> &'v [(Value, Value)] {
    value.as_map().unwrap_or_else(|| {
        panic!(
            "{operation} read from {} value, expected a map",
            value.kind_name()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_come_back_as_slices() {
        let list = Value::list(vec![Value::int(1)]);
        assert_eq!(list_items("test", &list).len(), 1);

        let map = Value::map(vec![(Value::int(1), Value::int(2))]);
        assert_eq!(map_entries("test", &map).len(), 1);
    }

    #[test]
    #[should_panic(expected = "read from int value, expected a list")]
    fn wrong_kinds_name_the_operation_and_the_kind() {
        list_items("test", &Value::int(3));
    }
}
