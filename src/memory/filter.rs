//! Evaluates backend filter inputs (`{ field: { eq: .. } }`, `and`/`or`/`not`)
//! against stored JSON records.

use serde_json::Value;

pub fn matches(filter: &Value, record: &Value) -> bool {
    let Some(clauses) = filter.as_object() else {
        return true;
    };

    clauses.iter().all(|(key, cond)| match key.as_str() {
        "and" => cond
            .as_array()
            .is_none_or(|filters| filters.iter().all(|f| matches(f, record))),
        "or" => cond
            .as_array()
            .is_none_or(|filters| filters.iter().any(|f| matches(f, record))),
        "not" => !matches(cond, record),
        field => field_matches(cond, record.get(field).unwrap_or(&Value::Null)),
    })
}

fn contains(value: &Value, operand: &Value) -> bool {
    match (value, operand) {
        (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
        (Value::Array(items), x) => items.contains(x),
        _ => false,
    }
}

fn field_matches(cond: &Value, value: &Value) -> bool {
    let Some(ops) = cond.as_object() else {
        return value == cond;
    };

    ops.iter().all(|(op, operand)| match op.as_str() {
        "eq" => value == operand,
        "ne" => value != operand,
        "contains" => contains(value, operand),
        "notContains" => !contains(value, operand),
        "beginsWith" => match (value.as_str(), operand.as_str()) {
            (Some(s), Some(prefix)) => s.starts_with(prefix),
            _ => false,
        },
        "attributeExists" => value.is_null() != operand.as_bool().unwrap_or(true),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn eq_and_or() {
        let record = json!({ "userID": "b", "isRead": false });
        assert!(matches(&json!({ "userID": { "eq": "b" } }), &record));
        assert!(matches(
            &json!({ "or": [{ "userID": { "eq": "a" } }, { "userID": { "eq": "b" } }] }),
            &record
        ));
        assert!(!matches(&json!({ "or": [] }), &record));
        assert!(matches(&json!({ "isRead": { "eq": false }, "userID": { "ne": "a" } }), &record));
    }

    #[test]
    fn contains_on_strings_and_lists() {
        assert!(matches(&json!({ "username": { "contains": "ali" } }), &json!({ "username": "kalina" })));
        assert!(matches(
            &json!({ "participants": { "contains": "u2" } }),
            &json!({ "participants": ["u1", "u2"] })
        ));
        assert!(!matches(&json!({ "missing": { "contains": "x" } }), &json!({})));
    }

    #[test]
    fn not_and_attribute_exists() {
        let record = json!({ "postID": null });
        assert!(matches(&json!({ "postID": { "attributeExists": false } }), &record));
        assert!(matches(&json!({ "not": { "postID": { "attributeExists": true } } }), &record));
    }
}
