//! Dotted/bracketed path lookup against the data chain.
//!
//! Supported syntax: `$trigger.payload.name`, `step.items[0]`,
//! `step["odd key"]`, `step['quoted']`. The first segment is always a chain
//! key; later segments descend into objects and arrays.

use serde_json::Value;

use crate::chain::DataChain;

#[derive(Debug, PartialEq)]
enum Segment {
  Key(String),
  Index(usize),
}

/// Resolve a path against the chain. Returns `None` for paths that cannot be
/// parsed or do not lead to a value.
pub(crate) fn lookup<'a>(chain: &'a DataChain, path: &str) -> Option<&'a Value> {
  let segments = parse(path)?;
  let mut segments = segments.iter();

  let root = match segments.next()? {
    Segment::Key(key) => chain.get(key)?,
    Segment::Index(_) => return None,
  };

  segments.try_fold(root, |value, segment| match segment {
    Segment::Key(key) => value.get(key.as_str()),
    Segment::Index(index) => value.get(index),
  })
}

/// Whether the text parses as a path at all. The interpolator keeps
/// malformed expressions literal instead of resolving them to null.
pub(crate) fn is_valid(path: &str) -> bool {
  parse(path).is_some()
}

/// Bare segment characters; anything else must go through bracket syntax.
fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || matches!(c, '_' | '-' | '$')
}

fn parse(path: &str) -> Option<Vec<Segment>> {
  let mut segments = Vec::new();
  let mut chars = path.trim().char_indices().peekable();
  let path = path.trim();
  let mut expect_ident = true;

  while let Some(&(start, ch)) = chars.peek() {
    match ch {
      '.' => {
        if expect_ident {
          return None;
        }
        chars.next();
        expect_ident = true;
      }
      '[' => {
        if expect_ident && !segments.is_empty() {
          return None;
        }
        chars.next();
        segments.push(parse_bracket(path, &mut chars)?);
        expect_ident = false;
      }
      _ => {
        if !expect_ident {
          return None;
        }
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
          if c == '.' || c == '[' {
            break;
          }
          end = i + c.len_utf8();
          chars.next();
        }
        let ident = &path[start..end];
        if ident.is_empty() || !ident.chars().all(is_ident_char) {
          return None;
        }
        segments.push(Segment::Key(ident.to_string()));
        expect_ident = false;
      }
    }
  }

  if expect_ident || segments.is_empty() {
    return None;
  }
  Some(segments)
}

fn parse_bracket(
  path: &str,
  chars: &mut std::iter::Peekable<std::str::CharIndices>,
) -> Option<Segment> {
  let &(start, first) = chars.peek()?;

  if first == '"' || first == '\'' {
    let quote = first;
    chars.next();
    let key_start = start + quote.len_utf8();
    let mut key_end = key_start;
    loop {
      let (i, c) = chars.next()?;
      if c == quote {
        key_end = i;
        break;
      }
      key_end = i + c.len_utf8();
    }
    match chars.next() {
      Some((_, ']')) => Some(Segment::Key(path[key_start..key_end].to_string())),
      _ => None,
    }
  } else {
    let mut end = start;
    loop {
      let (i, c) = chars.next()?;
      if c == ']' {
        end = i;
        break;
      }
      if !c.is_ascii_digit() {
        return None;
      }
      end = i + c.len_utf8();
    }
    path[start..end].parse().ok().map(Segment::Index)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn chain() -> DataChain {
    let mut chain = DataChain::new(
      json!({ "payload": { "name": "Ada", "items": [10, 20] } }),
      json!({ "trigger": "tester" }),
      json!({ "HOST": "example.test" }),
    );
    chain.record("step", json!({ "odd key": true, "nested": { "n": 1 } }));
    chain
  }

  #[test]
  fn test_dotted_lookup() {
    let chain = chain();

    assert_eq!(
      lookup(&chain, "$trigger.payload.name"),
      Some(&json!("Ada"))
    );
    assert_eq!(lookup(&chain, "step.nested.n"), Some(&json!(1)));
    assert_eq!(lookup(&chain, "$env.HOST"), Some(&json!("example.test")));
  }

  #[test]
  fn test_bracket_lookup() {
    let chain = chain();

    assert_eq!(lookup(&chain, "$trigger.payload.items[1]"), Some(&json!(20)));
    assert_eq!(lookup(&chain, "step[\"odd key\"]"), Some(&json!(true)));
    assert_eq!(lookup(&chain, "step['odd key']"), Some(&json!(true)));
  }

  #[test]
  fn test_unresolved_paths() {
    let chain = chain();

    assert_eq!(lookup(&chain, "missing"), None);
    assert_eq!(lookup(&chain, "step.nope"), None);
    assert_eq!(lookup(&chain, "$trigger.payload.items[9]"), None);
    // Indexing an object or descending into a scalar fails, not panics.
    assert_eq!(lookup(&chain, "step[0]"), None);
    assert_eq!(lookup(&chain, "$trigger.payload.name.deeper"), None);
  }

  #[test]
  fn test_malformed_paths() {
    let chain = chain();

    assert_eq!(lookup(&chain, ""), None);
    assert_eq!(lookup(&chain, "step."), None);
    assert_eq!(lookup(&chain, ".step"), None);
    assert_eq!(lookup(&chain, "step[abc]"), None);
    assert_eq!(lookup(&chain, "step[\"unclosed"), None);
    // Bare segments are restricted; odd keys go through bracket syntax.
    assert_eq!(lookup(&chain, "{ x }"), None);
    assert_eq!(lookup(&chain, "odd key"), None);
  }

  #[test]
  fn test_is_valid() {
    assert!(is_valid("$trigger.payload.name"));
    assert!(is_valid("step[\"odd key\"]"));
    assert!(!is_valid(""));
    assert!(!is_valid("{ x }"));
    assert!(!is_valid("not a path"));
  }
}
