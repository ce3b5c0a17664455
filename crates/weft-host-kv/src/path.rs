use serde_json::Value;

/// Walk a dotted path into a JSON value.
///
/// Each segment indexes an object by key, or an array by position. An empty
/// path returns the value itself.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
  if path.is_empty() {
    return Some(value);
  }

  path.split('.').try_fold(value, |current, segment| match current {
    Value::Object(map) => map.get(segment),
    Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
    _ => None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_nested_object() {
    let value = json!({"user": {"name": "Ada", "tags": ["a", "b"]}});
    assert_eq!(lookup_path(&value, "user.name"), Some(&json!("Ada")));
    assert_eq!(lookup_path(&value, "user.tags.1"), Some(&json!("b")));
    assert_eq!(lookup_path(&value, ""), Some(&value));
  }

  #[test]
  fn test_missing_segments() {
    let value = json!({"user": {"name": "Ada"}});
    assert_eq!(lookup_path(&value, "user.email"), None);
    assert_eq!(lookup_path(&value, "user.name.first"), None);
    assert_eq!(lookup_path(&json!([1, 2]), "x"), None);
  }
}
