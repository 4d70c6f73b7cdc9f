// Copyright (c) 2025 - Cowboy AI, Inc.
//! Free-form filter expressions evaluated against record payloads
//!
//! The inventory only depends on the [`ExpressionMatcher`] contract. The bundled
//! [`PathEqualityMatcher`] covers the common case of matching payload fields:
//!
//! ```text
//! status == "Running" && config.limits.cpu != "1" && expanded_devices.root.pool == 'local'
//! ```

use serde_json::Value;

use crate::domain::ValidationError;

/// Evaluates a boolean expression against a resource payload
pub trait ExpressionMatcher: Send + Sync {
    /// Returns whether `object` satisfies `expression`
    ///
    /// An expression that cannot be evaluated is a validation error, never a
    /// silent non-match.
    fn matches(&self, expression: &str, object: &Value) -> Result<bool, ValidationError>;
}

/// Conjunction of `path == literal` / `path != literal` clauses
///
/// `path` is a dotted path into the payload (array elements by index), and
/// `literal` is a JSON scalar or a single-quoted string. Missing paths compare
/// as `null`. Operators and `&&` inside a quoted literal belong to the literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEqualityMatcher;

#[derive(Debug, PartialEq)]
enum Comparison {
    Equal,
    NotEqual,
}

#[derive(Debug, PartialEq)]
struct Clause {
    pointer: String,
    comparison: Comparison,
    literal: Value,
}

impl PathEqualityMatcher {
    pub fn new() -> Self {
        Self
    }

    fn parse_clause(clause: &str) -> Result<Clause, ValidationError> {
        let invalid = || ValidationError::InvalidExpression(clause.to_string());

        let (at, operator, comparison) = [("!=", Comparison::NotEqual), ("==", Comparison::Equal)]
            .into_iter()
            .filter_map(|(operator, comparison)| {
                find_unquoted(clause, operator)
                    .first()
                    .map(|&at| (at, operator, comparison))
            })
            .min_by_key(|(at, ..)| *at)
            .ok_or_else(invalid)?;
        let (path, literal) = (&clause[..at], &clause[at + operator.len()..]);

        let path = path.trim();
        if path.is_empty() || path.split('.').any(|segment| segment.trim().is_empty()) {
            return Err(invalid());
        }

        let literal = literal.trim();
        let literal = match literal.strip_prefix('\'').and_then(|l| l.strip_suffix('\'')) {
            Some(quoted) => Value::String(quoted.to_string()),
            None => serde_json::from_str::<Value>(literal).map_err(|_| invalid())?,
        };

        if literal.is_array() || literal.is_object() {
            return Err(invalid());
        }

        let pointer = path
            .split('.')
            .map(|segment| segment.trim().replace('~', "~0").replace('/', "~1"))
            .fold(String::new(), |mut pointer, segment| {
                pointer.push('/');
                pointer.push_str(&segment);
                pointer
            });

        Ok(Clause {
            pointer,
            comparison,
            literal,
        })
    }
}

impl ExpressionMatcher for PathEqualityMatcher {
    fn matches(&self, expression: &str, object: &Value) -> Result<bool, ValidationError> {
        if expression.trim().is_empty() {
            return Ok(true);
        }

        let clauses = split_unquoted(expression, "&&")
            .into_iter()
            .map(Self::parse_clause)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(clauses.iter().all(|clause| {
            let actual = object.pointer(&clause.pointer).unwrap_or(&Value::Null);
            match clause.comparison {
                Comparison::Equal => *actual == clause.literal,
                Comparison::NotEqual => *actual != clause.literal,
            }
        }))
    }
}

/// Byte offsets of non-overlapping `pattern` matches outside quoted literals
fn find_unquoted(input: &str, pattern: &str) -> Vec<usize> {
    let mut found = Vec::new();
    let mut quote = None;
    let mut escaped = false;
    let mut resume = 0;

    for (i, c) in input.char_indices() {
        if i < resume {
            continue;
        }
        match quote {
            Some(_) if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if input[i..].starts_with(pattern) => {
                found.push(i);
                resume = i + pattern.len();
            }
            None => {}
        }
    }

    found
}

fn split_unquoted<'a>(input: &'a str, pattern: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for at in find_unquoted(input, pattern) {
        parts.push(&input[start..at]);
        start = at + pattern.len();
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance() -> Value {
        json!({
            "name": "web01",
            "status": "Running",
            "config": { "limits.cpu": "2" },
            "devices": [{ "type": "disk" }],
            "ephemeral": false,
        })
    }

    #[test]
    fn test_empty_expression_matches() {
        assert!(PathEqualityMatcher.matches("  ", &instance()).unwrap());
    }

    #[test]
    fn test_equality_and_inequality() {
        let m = PathEqualityMatcher::new();
        assert!(m.matches(r#"status == "Running""#, &instance()).unwrap());
        assert!(!m.matches(r#"status != "Running""#, &instance()).unwrap());
        assert!(m.matches("name == 'web01' && ephemeral == false", &instance()).unwrap());
        assert!(m.matches("devices.0.type == 'disk'", &instance()).unwrap());
    }

    #[test]
    fn test_operators_inside_quoted_literals() {
        let m = PathEqualityMatcher::new();
        let object = json!({
            "name": "web01",
            "description": "a&&b",
            "note": "x != y",
            "quoted": "say \"a==b\"",
        });

        assert!(m.matches("description == 'a&&b'", &object).unwrap());
        assert!(m.matches(r#"note == "x != y""#, &object).unwrap());
        assert!(m.matches(r#"quoted == "say \"a==b\"""#, &object).unwrap());
        assert!(m
            .matches("name == 'web01' && description != 'a&&c'", &object)
            .unwrap());
        assert!(!m.matches("description == 'a' && name == 'web01'", &object).unwrap());
    }

    #[test]
    fn test_missing_path_compares_as_null() {
        let m = PathEqualityMatcher::new();
        assert!(m.matches("location == null", &instance()).unwrap());
        assert!(!m.matches("location == 'none'", &instance()).unwrap());
    }

    #[test]
    fn test_invalid_expressions() {
        let m = PathEqualityMatcher::new();
        for expression in ["status", "== 'x'", "status == Running", "a..b == 1", "a == [1]"] {
            assert!(
                matches!(
                    m.matches(expression, &instance()),
                    Err(ValidationError::InvalidExpression(_))
                ),
                "expected {expression} to be rejected"
            );
        }
    }
}
