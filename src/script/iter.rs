// ABOUTME: `for` loop iterator protocol over the four concrete source kinds (component H)

use crate::value::Value;

/// Iterator state living on a `for` line's `data` field (§3.4), built once
/// on first entry to the loop and advanced on each re-entry. `Dict`
/// re-evaluates its source expression on every step so mid-iteration
/// inserts into the underlying dict are visible (§4.8) — the other three
/// kinds snapshot their source once, since only dict iteration is
/// specified to tolerate live mutation.
#[derive(Debug, Clone)]
pub enum ForIter {
    Array { items: Vec<Value>, pos: usize },
    String { chars: Vec<char>, pos: usize },
    Dict { source_expr: String, pos: usize },
}

impl ForIter {
    pub fn from_value(value: &Value, source_expr: &str) -> Option<ForIter> {
        match value {
            Value::Array(items) => Some(ForIter::Array { items: items.clone(), pos: 0 }),
            Value::String(s) => Some(ForIter::String {
                chars: s.chars().collect(),
                pos: 0,
            }),
            Value::Dict(_) => Some(ForIter::Dict {
                source_expr: source_expr.to_string(),
                pos: 0,
            }),
            // An object that opts into the iterator protocol (§4.8,
            // HostObject::iter_values) is snapshotted once, like an array.
            Value::Object(obj) => obj.iter_values().map(|items| ForIter::Array { items, pos: 0 }),
            _ => None,
        }
    }

    /// Pulls the next value, re-evaluating `source_expr` for the `Dict`
    /// case via `reread`. Returns `None` at end of iteration.
    pub fn next(&mut self, reread: impl FnOnce(&str) -> Value) -> Option<Value> {
        match self {
            ForIter::Array { items, pos } => {
                let v = items.get(*pos).cloned();
                if v.is_some() {
                    *pos += 1;
                }
                v
            }
            ForIter::String { chars, pos } => {
                let v = chars.get(*pos).map(|c| Value::String(c.to_string()));
                if v.is_some() {
                    *pos += 1;
                }
                v
            }
            ForIter::Dict { source_expr, pos } => {
                let current = reread(source_expr);
                if let Value::Dict(map) = current {
                    let v = map.get_index(*pos).map(|(_, v)| v.clone());
                    if v.is_some() {
                        *pos += 1;
                    }
                    v
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_iterates_in_order() {
        let v = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let mut it = ForIter::from_value(&v, "x").unwrap();
        assert_eq!(it.next(|_| Value::Number(0.0)), Some(Value::Number(1.0)));
        assert_eq!(it.next(|_| Value::Number(0.0)), Some(Value::Number(2.0)));
        assert_eq!(it.next(|_| Value::Number(0.0)), None);
    }

    #[test]
    fn string_iterates_per_codepoint() {
        let v = Value::String("ab".to_string());
        let mut it = ForIter::from_value(&v, "x").unwrap();
        assert_eq!(it.next(|_| Value::Number(0.0)), Some(Value::String("a".to_string())));
        assert_eq!(it.next(|_| Value::Number(0.0)), Some(Value::String("b".to_string())));
        assert_eq!(it.next(|_| Value::Number(0.0)), None);
    }

    #[test]
    fn dict_rereads_source_each_step() {
        use indexmap::IndexMap;
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Number(1.0));
        let v = Value::Dict(map.clone());
        let mut it = ForIter::from_value(&v, "d").unwrap();
        assert_eq!(it.next(|_| Value::Dict(map.clone())), Some(Value::Number(1.0)));

        map.insert("b".to_string(), Value::Number(2.0));
        assert_eq!(it.next(|_| Value::Dict(map.clone())), Some(Value::Number(2.0)));
    }

    #[test]
    fn non_iterable_value_has_no_iterator() {
        assert!(ForIter::from_value(&Value::Number(1.0), "x").is_none());
    }

    struct ListObject(Vec<Value>);
    impl crate::value::HostObject for ListObject {
        fn get_property(&self, _name: &str) -> Option<Value> {
            None
        }
        fn object_id(&self) -> usize {
            0
        }
        fn iter_values(&self) -> Option<Vec<Value>> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn object_opting_into_iteration_behaves_like_an_array() {
        use std::rc::Rc;
        let obj = Value::Object(Rc::new(ListObject(vec![Value::Number(7.0)])));
        let mut it = ForIter::from_value(&obj, "x").unwrap();
        assert_eq!(it.next(|_| Value::Number(0.0)), Some(Value::Number(7.0)));
        assert_eq!(it.next(|_| Value::Number(0.0)), None);
    }
}
