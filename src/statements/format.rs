use super::scanner::{ScanState, scan_identifier};
use super::{PlaceholderStyle, StatementTemplate};
use crate::error::DispatchError;
use crate::types::{BoundStatement, NamedArgs, SqlValue};

/// Bind a template's `:name` markers against the supplied arguments.
///
/// Markers inside string literals and comments are left untouched, and `::`
/// (cast syntax) is never a marker. The bound-value list is produced in the
/// order markers are emitted, so a name referenced twice binds twice.
pub(super) fn bind_statement(
    template: &StatementTemplate,
    style: &PlaceholderStyle,
    args: &NamedArgs,
) -> Result<BoundStatement, DispatchError> {
    let raw = template.raw_text.as_str();
    let bytes = raw.as_bytes();
    let mut query = String::with_capacity(raw.len());
    let mut params: Vec<SqlValue> = Vec::new();
    // Text between markers is copied in segments so multi-byte characters
    // pass through untouched.
    let mut segment_start = 0usize;
    let mut idx = 0usize;
    let mut state = ScanState::Normal;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            ScanState::Normal => match b {
                b'\'' => {
                    state = ScanState::SingleQuoted;
                    idx += 1;
                }
                b'"' => {
                    state = ScanState::DoubleQuoted;
                    idx += 1;
                }
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = ScanState::LineComment;
                    idx += 2;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = ScanState::BlockComment(1);
                    idx += 2;
                }
                b':' if bytes.get(idx + 1) == Some(&b':') => {
                    // Cast syntax, not a marker.
                    idx += 2;
                }
                b':' => {
                    if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                        query.push_str(&raw[segment_start..idx]);
                        let value = args.get(name).ok_or_else(|| {
                            DispatchError::MissingArgument {
                                statement: template.name.clone(),
                                argument: name.to_string(),
                            }
                        })?;
                        match style {
                            PlaceholderStyle::Positional(marker) => query.push_str(marker),
                            PlaceholderStyle::Named => query.push_str(&raw[idx..end]),
                        }
                        params.push(value.clone());
                        segment_start = end;
                        idx = end;
                    } else {
                        idx += 1;
                    }
                }
                _ => idx += 1,
            },
            ScanState::SingleQuoted => {
                if b == b'\'' {
                    state = ScanState::Normal;
                }
                idx += 1;
            }
            ScanState::DoubleQuoted => {
                if b == b'"' {
                    state = ScanState::Normal;
                }
                idx += 1;
            }
            ScanState::LineComment => {
                if b == b'\n' {
                    state = ScanState::Normal;
                }
                idx += 1;
            }
            ScanState::BlockComment(depth) => {
                if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth <= 1 {
                        ScanState::Normal
                    } else {
                        ScanState::BlockComment(depth - 1)
                    };
                    idx += 2;
                } else if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = ScanState::BlockComment(depth + 1);
                    idx += 2;
                } else {
                    idx += 1;
                }
            }
        }
    }

    query.push_str(&raw[segment_start..]);
    Ok(BoundStatement { query, params })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(raw: &str) -> StatementTemplate {
        StatementTemplate::new("t", raw, Vec::<String>::new())
    }

    fn args(pairs: &[(&str, SqlValue)]) -> NamedArgs {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn binds_positional_markers_in_order() {
        let bound = bind_statement(
            &template("INSERT INTO users (name, age) VALUES (:name, :age)"),
            &PlaceholderStyle::question_mark(),
            &args(&[
                ("name", SqlValue::Text("Alice".into())),
                ("age", SqlValue::Int(30)),
            ]),
        )
        .unwrap();
        assert_eq!(bound.query, "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(
            bound.params,
            vec![SqlValue::Text("Alice".into()), SqlValue::Int(30)]
        );
    }

    #[test]
    fn named_style_leaves_markers_inline() {
        let bound = bind_statement(
            &template("UPDATE t SET a = :a WHERE b = :b"),
            &PlaceholderStyle::Named,
            &args(&[("a", SqlValue::Int(1)), ("b", SqlValue::Int(2))]),
        )
        .unwrap();
        assert_eq!(bound.query, "UPDATE t SET a = :a WHERE b = :b");
        assert_eq!(bound.params, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn repeated_marker_binds_twice() {
        let bound = bind_statement(
            &template("SELECT * FROM t WHERE a = :v OR b = :v"),
            &PlaceholderStyle::question_mark(),
            &args(&[("v", SqlValue::Int(7))]),
        )
        .unwrap();
        assert_eq!(bound.query, "SELECT * FROM t WHERE a = ? OR b = ?");
        assert_eq!(bound.params, vec![SqlValue::Int(7), SqlValue::Int(7)]);
    }

    #[test]
    fn skips_markers_inside_literals_and_comments() {
        let raw = "SELECT ':skip', \":skip\" -- :skip\n/* :skip */ FROM t WHERE a = :real";
        let bound = bind_statement(
            &template(raw),
            &PlaceholderStyle::question_mark(),
            &args(&[("real", SqlValue::Int(1))]),
        )
        .unwrap();
        assert_eq!(
            bound.query,
            "SELECT ':skip', \":skip\" -- :skip\n/* :skip */ FROM t WHERE a = ?"
        );
        assert_eq!(bound.params, vec![SqlValue::Int(1)]);
    }

    #[test]
    fn double_colon_cast_is_not_a_marker() {
        let bound = bind_statement(
            &template("SELECT a::text FROM t WHERE b = :b"),
            &PlaceholderStyle::question_mark(),
            &args(&[("b", SqlValue::Int(5))]),
        )
        .unwrap();
        assert_eq!(bound.query, "SELECT a::text FROM t WHERE b = ?");
        assert_eq!(bound.params, vec![SqlValue::Int(5)]);
    }

    #[test]
    fn missing_argument_is_an_error() {
        let err = bind_statement(
            &template("SELECT * FROM t WHERE a = :a"),
            &PlaceholderStyle::question_mark(),
            &NamedArgs::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingArgument { statement, argument }
                if statement == "t" && argument == "a"
        ));
    }

    #[test]
    fn unreferenced_arguments_are_ignored() {
        let bound = bind_statement(
            &template("SELECT * FROM t WHERE a = :a"),
            &PlaceholderStyle::question_mark(),
            &args(&[
                ("a", SqlValue::Int(1)),
                ("unused", SqlValue::Text("x".into())),
            ]),
        )
        .unwrap();
        assert_eq!(bound.params, vec![SqlValue::Int(1)]);
    }

    #[test]
    fn formatting_is_deterministic() {
        let t = template("SELECT * FROM t WHERE a = :a AND b = :b");
        let a = args(&[("a", SqlValue::Int(1)), ("b", SqlValue::Text("x".into()))]);
        let first = bind_statement(&t, &PlaceholderStyle::question_mark(), &a).unwrap();
        let second = bind_statement(&t, &PlaceholderStyle::question_mark(), &a).unwrap();
        assert_eq!(first, second);
    }
}
