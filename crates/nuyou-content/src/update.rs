//! Dot-path updates of content documents.
//!
//! A field path such as `hero.title` or `faqs.2.question` addresses a
//! location inside a document. Updating never fails: missing intermediate
//! levels are created as empty mappings and a scalar sitting where a
//! container is needed is replaced by one.
//!
//! Numeric segments are plain mapping keys unless they land on a sequence
//! that already exists in the document:
//!
//! | Container | Segment `2`                          |
//! |-----------|--------------------------------------|
//! | mapping   | key `"2"`                            |
//! | sequence of length > 2 | element 2, in place     |
//! | sequence of length 2   | appended                |
//! | shorter sequence       | converted to a mapping keyed `"0"`, `"1"`, ... |

use serde_json::{Map, Value};

/// Set `value` at `path` inside `tree`, returning the updated tree.
///
/// # Example
///
/// ```
/// use nuyou_content::update;
/// use serde_json::json;
///
/// let tree = update(json!({}), "faqs.2.question", json!("Why?"));
/// assert_eq!(tree, json!({"faqs": {"2": {"question": "Why?"}}}));
/// ```
#[must_use]
pub fn update(tree: Value, path: &str, value: Value) -> Value {
    let segments: Vec<&str> = path.split('.').collect();
    set_at(tree, &segments, value)
}

/// Apply every `path -> value` pair of `fields` in order.
#[must_use]
pub fn apply_fields<I>(tree: Value, fields: I) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    fields
        .into_iter()
        .fold(tree, |tree, (path, value)| update(tree, &path, value))
}

fn set_at(node: Value, segments: &[&str], value: Value) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return value;
    };

    match node {
        Value::Array(items) => set_in_array(items, head, rest, value),
        Value::Object(map) => Value::Object(set_in_map(map, head, rest, value)),
        // Scalars are overwritten by a fresh container
        _ => Value::Object(set_in_map(Map::new(), head, rest, value)),
    }
}

fn set_in_map(
    mut map: Map<String, Value>,
    key: &str,
    rest: &[&str],
    value: Value,
) -> Map<String, Value> {
    // Update in place so existing keys keep their position
    if let Some(slot) = map.get_mut(key) {
        let child = std::mem::take(slot);
        *slot = set_at(child, rest, value);
    } else {
        map.insert(key.to_owned(), set_at(Value::Object(Map::new()), rest, value));
    }
    map
}

fn set_in_array(mut items: Vec<Value>, segment: &str, rest: &[&str], value: Value) -> Value {
    match parse_index(segment) {
        Some(index) if index < items.len() => {
            let child = std::mem::take(&mut items[index]);
            items[index] = set_at(child, rest, value);
            Value::Array(items)
        }
        Some(index) if index == items.len() => {
            items.push(set_at(Value::Object(Map::new()), rest, value));
            Value::Array(items)
        }
        _ => {
            let map = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item))
                .collect();
            Value::Object(set_in_map(map, segment, rest, value))
        }
    }
}

/// A segment made only of ASCII digits is a sequence index.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_creates_intermediate_mappings() {
        let tree = update(json!({}), "a.b.c", json!("v"));
        assert_eq!(tree, json!({"a": {"b": {"c": "v"}}}));
        assert_eq!(tree["a"]["b"]["c"], "v");
    }

    #[test]
    fn test_single_segment() {
        let tree = update(json!({"keep": 1}), "title", json!("Hello"));
        assert_eq!(tree, json!({"keep": 1, "title": "Hello"}));
    }

    #[test]
    fn test_preserves_siblings() {
        let tree = json!({"hero": {"title": "Old", "subtitle": "Sub"}, "other": true});
        let tree = update(tree, "hero.title", json!("New"));
        assert_eq!(
            tree,
            json!({"hero": {"title": "New", "subtitle": "Sub"}, "other": true})
        );
    }

    #[test]
    fn test_numeric_segment_on_fresh_tree_is_string_key() {
        let tree = update(json!({}), "faqs.2", json!("third"));
        assert_eq!(tree, json!({"faqs": {"2": "third"}}));
        assert!(tree["faqs"].is_object());

        let text = serde_json::to_string(&tree).unwrap();
        assert_eq!(text, r#"{"faqs":{"2":"third"}}"#);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["faqs"]["2"], "third");
    }

    #[test]
    fn test_second_update_only_changes_leaf() {
        let once = update(json!({}), "faqs.0.question", json!("first"));
        let twice = update(once.clone(), "faqs.0.question", json!("second"));
        assert_eq!(twice, json!({"faqs": {"0": {"question": "second"}}}));

        // Same shape: only the leaf differs
        assert_eq!(
            update(once, "faqs.0.question", json!(null)),
            update(twice, "faqs.0.question", json!(null))
        );
    }

    #[test]
    fn test_scalar_prefix_is_replaced() {
        let tree = json!({"hero": "plain text"});
        let tree = update(tree, "hero.title", json!("T"));
        assert_eq!(tree, json!({"hero": {"title": "T"}}));
    }

    #[test]
    fn test_scalar_root_is_replaced() {
        let tree = update(json!(42), "a", json!(1));
        assert_eq!(tree, json!({"a": 1}));
    }

    #[test]
    fn test_overwrites_container_at_leaf() {
        let tree = json!({"about": {"image": {"src": "x"}}});
        let tree = update(tree, "about.image", json!("/img.png"));
        assert_eq!(tree, json!({"about": {"image": "/img.png"}}));
    }

    #[test]
    fn test_existing_sequence_index_in_place() {
        let tree = json!({"faqs": [{"q": "a"}, {"q": "b"}]});
        let tree = update(tree, "faqs.1.q", json!("B"));
        assert_eq!(tree, json!({"faqs": [{"q": "a"}, {"q": "B"}]}));
    }

    #[test]
    fn test_existing_sequence_append() {
        let tree = json!({"faqs": ["a", "b"]});
        let tree = update(tree, "faqs.2", json!("c"));
        assert_eq!(tree, json!({"faqs": ["a", "b", "c"]}));
    }

    #[test]
    fn test_existing_sequence_gap_becomes_mapping() {
        let tree = json!({"faqs": ["a"]});
        let tree = update(tree, "faqs.5", json!("f"));
        assert_eq!(tree, json!({"faqs": {"0": "a", "5": "f"}}));
    }

    #[test]
    fn test_existing_sequence_named_key_becomes_mapping() {
        let tree = json!({"items": ["a"]});
        let tree = update(tree, "items.title", json!("T"));
        assert_eq!(tree, json!({"items": {"0": "a", "title": "T"}}));
    }

    #[test]
    fn test_malformed_paths_use_empty_keys() {
        assert_eq!(update(json!({}), "", json!(1)), json!({"": 1}));
        assert_eq!(update(json!({}), "a.", json!(1)), json!({"a": {"": 1}}));
        assert_eq!(update(json!({}), "a..b", json!(1)), json!({"a": {"": {"b": 1}}}));
    }

    #[test]
    fn test_apply_fields_in_order() {
        let fields = vec![
            ("hero.title".to_owned(), json!("One")),
            ("hero.title".to_owned(), json!("Two")),
            ("coming_soon.text".to_owned(), json!("Soon")),
        ];
        let tree = apply_fields(json!({}), fields);
        assert_eq!(
            tree,
            json!({"hero": {"title": "Two"}, "coming_soon": {"text": "Soon"}})
        );
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index(""), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1a"), None);
        assert_eq!(parse_index("+1"), None);
    }
}
