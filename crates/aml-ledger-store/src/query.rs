//! Rich query evaluation for the in-memory ledger
//!
//! Queries use the CouchDB/Mango selector syntax that state databases of
//! permissioned ledgers accept:
//!
//! ```json
//! {"selector": {"country": "TWN", "risk_level": {"$in": ["medium", "high"]}}}
//! ```
//!
//! Each selector field is a dotted path into the stored JSON document. Its
//! condition is either a literal (equality) or an object of operators.
//! Supported operators are `$eq`, `$ne` and `$in`. A document that is not a
//! JSON object, or that lacks a referenced field, does not match.

use aml_ledger_types::{StoreError, StoreResult};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(Value),
    Ne(Value),
    In(Vec<Value>),
}

impl Condition {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Condition::Eq(expected) => value == expected,
            Condition::Ne(expected) => value != expected,
            Condition::In(options) => options.contains(value),
        }
    }
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    clauses: Vec<(Vec<String>, Condition)>,
}

impl Selector {
    /// Parse a query string of the form `{"selector": {...}}`.
    pub fn parse(query: &str) -> StoreResult<Self> {
        let root: Value = serde_json::from_str(query)
            .map_err(|e| StoreError::InvalidQuery(format!("query is not valid JSON: {e}")))?;

        let selector = root
            .as_object()
            .and_then(|obj| obj.get("selector"))
            .ok_or_else(|| StoreError::InvalidQuery("query has no \"selector\"".to_string()))?
            .as_object()
            .ok_or_else(|| StoreError::InvalidQuery("\"selector\" must be an object".to_string()))?;

        let mut clauses = Vec::new();
        for (field, condition) in selector {
            if field.starts_with('$') {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported combination operator {field}"
                )));
            }
            let path = parse_path(field)?;
            for condition in parse_conditions(field, condition)? {
                clauses.push((path.clone(), condition));
            }
        }

        Ok(Self { clauses })
    }

    /// True if `document` (raw stored bytes) satisfies every clause.
    pub fn matches_bytes(&self, document: &[u8]) -> bool {
        match serde_json::from_slice::<Value>(document) {
            Ok(value) => self.matches(&value),
            Err(_) => false,
        }
    }

    /// True if `document` satisfies every clause.
    pub fn matches(&self, document: &Value) -> bool {
        let Some(root) = document.as_object() else {
            return false;
        };
        self.clauses.iter().all(|(path, condition)| {
            lookup(root, path).is_some_and(|value| condition.matches(value))
        })
    }
}

fn parse_path(field: &str) -> StoreResult<Vec<String>> {
    let segments: Vec<String> = field.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(StoreError::InvalidQuery(format!("invalid field path {field:?}")));
    }
    Ok(segments)
}

fn parse_conditions(field: &str, condition: &Value) -> StoreResult<Vec<Condition>> {
    let operators = match condition {
        Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => obj,
        literal => return Ok(vec![Condition::Eq(literal.clone())]),
    };

    let mut conditions = Vec::with_capacity(operators.len());
    for (op, arg) in operators {
        let condition = match op.as_str() {
            "$eq" => Condition::Eq(arg.clone()),
            "$ne" => Condition::Ne(arg.clone()),
            "$in" => match arg {
                Value::Array(options) => Condition::In(options.clone()),
                _ => {
                    return Err(StoreError::InvalidQuery(format!(
                        "$in on {field} requires an array"
                    )));
                },
            },
            other if other.starts_with('$') => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported operator {other} on {field}"
                )));
            },
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "cannot mix operators and field {other} in condition on {field}"
                )));
            },
        };
        conditions.push(condition);
    }
    Ok(conditions)
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = root.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc() -> Value {
        json!({
            "last_name": "Lee",
            "country": "TWN",
            "data_owner": "org0MSP",
            "risk_level": "low",
            "meta": {"source": "kyc"}
        })
    }

    #[test]
    fn test_literal_equality() {
        let selector = Selector::parse(r#"{"selector":{"country":"TWN"}}"#).unwrap();
        assert!(selector.matches(&doc()));

        let selector = Selector::parse(r#"{"selector":{"country":"HKG"}}"#).unwrap();
        assert!(!selector.matches(&doc()));
    }

    #[test]
    fn test_all_clauses_must_match() {
        let selector =
            Selector::parse(r#"{"selector":{"country":"TWN","data_owner":"org1MSP"}}"#).unwrap();
        assert!(!selector.matches(&doc()));
    }

    #[test]
    fn test_operators() {
        let selector = Selector::parse(
            r#"{"selector":{"risk_level":{"$in":["low","medium"]},"country":{"$ne":"HKG"}}}"#,
        )
        .unwrap();
        assert!(selector.matches(&doc()));

        let selector = Selector::parse(r#"{"selector":{"data_owner":{"$eq":"org0MSP"}}}"#).unwrap();
        assert!(selector.matches(&doc()));
    }

    #[test]
    fn test_dotted_path() {
        let selector = Selector::parse(r#"{"selector":{"meta.source":"kyc"}}"#).unwrap();
        assert!(selector.matches(&doc()));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let selector = Selector::parse(r#"{"selector":{"first_name":{"$ne":"x"}}}"#).unwrap();
        assert!(!selector.matches(&doc()));
    }

    #[test]
    fn test_empty_selector_matches_any_object() {
        let selector = Selector::parse(r#"{"selector":{}}"#).unwrap();
        assert!(selector.matches(&doc()));
        assert!(!selector.matches(&json!([1, 2])));
        assert!(!selector.matches_bytes(b"not json"));
    }

    #[test]
    fn test_malformed_queries_rejected() {
        for query in [
            "",
            "not json",
            "[]",
            r#"{"fields":["country"]}"#,
            r#"{"selector":"country"}"#,
            r#"{"selector":{"$or":[]}}"#,
            r#"{"selector":{"country":{"$gt":"A"}}}"#,
            r#"{"selector":{"country":{"$in":"TWN"}}}"#,
            r#"{"selector":{"a..b":1}}"#,
        ] {
            let result = Selector::parse(query);
            assert!(
                matches!(result, Err(StoreError::InvalidQuery(_))),
                "expected InvalidQuery for {query:?}"
            );
        }
    }
}
