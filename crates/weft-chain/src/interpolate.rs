//! Template interpolation against the data chain.

use serde_json::Value;

use crate::chain::DataChain;
use crate::path::{is_valid, lookup};

/// Resolve every `{{ path }}` expression in `value` against the chain.
///
/// Non-string scalars pass through unchanged; arrays and objects are walked
/// recursively. A string that is exactly one expression substitutes the
/// resolved value with its native type preserved; expressions embedded in
/// longer text are rendered to text. A well-formed path that leads nowhere
/// resolves to null; a malformed expression stays literal, like an
/// unterminated one.
pub fn interpolate(value: &Value, chain: &DataChain) -> Value {
  match value {
    Value::String(text) => interpolate_text(text, chain),
    Value::Array(items) => Value::Array(items.iter().map(|v| interpolate(v, chain)).collect()),
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| (k.clone(), interpolate(v, chain)))
        .collect(),
    ),
    _ => value.clone(),
  }
}

/// Render a resolved value as text for embedding in a larger string.
///
/// Strings render raw (no quotes), null renders empty, everything else as
/// compact JSON.
pub fn to_text(value: &Value) -> String {
  match value {
    Value::String(text) => text.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

fn interpolate_text(text: &str, chain: &DataChain) -> Value {
  if let Some(path) = whole_expression(text) {
    if is_valid(path) {
      return lookup(chain, path).cloned().unwrap_or(Value::Null);
    }
  }
  if !text.contains("{{") {
    return Value::String(text.to_string());
  }

  let mut out = String::with_capacity(text.len());
  let mut rest = text;
  while let Some(open) = rest.find("{{") {
    out.push_str(&rest[..open]);
    let after = &rest[open + 2..];
    match after.find("}}") {
      Some(close) => {
        let path = after[..close].trim();
        if is_valid(path) {
          let resolved = lookup(chain, path).cloned().unwrap_or(Value::Null);
          out.push_str(&to_text(&resolved));
        } else {
          // Malformed expression: keep the literal text.
          out.push_str(&rest[open..open + close + 4]);
        }
        rest = &after[close + 2..];
      }
      None => {
        // Unterminated expression: keep the literal text.
        out.push_str(&rest[open..]);
        rest = "";
      }
    }
  }
  out.push_str(rest);
  Value::String(out)
}

/// If the whole string is exactly one `{{ path }}` expression, return the
/// inner path.
fn whole_expression(text: &str) -> Option<&str> {
  let trimmed = text.trim();
  let inner = trimmed.strip_prefix("{{")?.strip_suffix("}}")?;
  if inner.contains("{{") || inner.contains("}}") {
    return None;
  }
  Some(inner.trim())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn chain() -> DataChain {
    let mut chain = DataChain::new(
      json!({ "payload": { "name": "Ada", "count": 3 } }),
      json!({ "trigger": "tester" }),
      json!({ "HOST": "example.test" }),
    );
    chain.record("fetch", json!({ "items": [1, 2, 3], "label": "ready" }));
    chain
  }

  #[test]
  fn test_primitives_pass_through() {
    let chain = chain();

    for value in [json!(42), json!(true), json!(null), json!(1.5)] {
      assert_eq!(interpolate(&value, &chain), value);
    }
  }

  #[test]
  fn test_plain_strings_are_idempotent() {
    let chain = chain();
    let value = json!("no templates here");

    assert_eq!(interpolate(&value, &chain), value);
  }

  #[test]
  fn test_whole_expression_preserves_type() {
    let chain = chain();

    assert_eq!(
      interpolate(&json!("{{ $last }}"), &chain),
      chain.last().clone()
    );
    assert_eq!(
      interpolate(&json!("{{ fetch.items }}"), &chain),
      json!([1, 2, 3])
    );
    assert_eq!(
      interpolate(&json!("{{ $trigger.payload.count }}"), &chain),
      json!(3)
    );
  }

  #[test]
  fn test_embedded_expressions_render_to_text() {
    let chain = chain();

    assert_eq!(
      interpolate(&json!("hello {{ $trigger.payload.name }}!"), &chain),
      json!("hello Ada!")
    );
    assert_eq!(
      interpolate(&json!("{{ fetch.label }}: {{ fetch.items }}"), &chain),
      json!("ready: [1,2,3]")
    );
  }

  #[test]
  fn test_unresolved_path_is_null() {
    let chain = chain();

    assert_eq!(interpolate(&json!("{{ missing.path }}"), &chain), json!(null));
    // Embedded, an unresolved expression renders as empty text.
    assert_eq!(
      interpolate(&json!("x={{ missing.path }}y"), &chain),
      json!("x=y")
    );
  }

  #[test]
  fn test_containers_are_walked_recursively() {
    let chain = chain();
    let options = json!({
      "message": "hi {{ $trigger.payload.name }}",
      "items": "{{ fetch.items }}",
      "nested": { "host": "{{ $env.HOST }}" },
      "list": ["{{ fetch.label }}", 7]
    });

    assert_eq!(
      interpolate(&options, &chain),
      json!({
        "message": "hi Ada",
        "items": [1, 2, 3],
        "nested": { "host": "example.test" },
        "list": ["ready", 7]
      })
    );
  }

  #[test]
  fn test_malformed_expression_is_literal() {
    let chain = chain();

    // Extra braces, empty, and non-path inner text all stay untouched
    // rather than resolving to null.
    for text in ["{{{ fetch.label }}}", "{{ }}", "{{ not a path }}"] {
      assert_eq!(interpolate(&json!(text), &chain), json!(text), "{text}");
    }
  }

  #[test]
  fn test_unterminated_expression_is_literal() {
    let chain = chain();

    assert_eq!(
      interpolate(&json!("oops {{ fetch.label"), &chain),
      json!("oops {{ fetch.label")
    );
  }

  #[test]
  fn test_to_text() {
    assert_eq!(to_text(&json!("raw")), "raw");
    assert_eq!(to_text(&json!(null)), "");
    assert_eq!(to_text(&json!({"a": 1})), "{\"a\":1}");
    assert_eq!(to_text(&json!(5)), "5");
  }
}
