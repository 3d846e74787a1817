//! Label text substitution.
//!
//! Layout labels may contain `{dot.path}` tokens that are replaced with the
//! value found at that path in the current snapshot, e.g.
//! `"Turn: {game_board.turn}"`.

use serde_json::Value;

/// Replaces every `{path}` token in `template` with the value at that path
/// in `state`.
///
/// Strings are inserted without quotes, other values in their JSON form.
/// Tokens whose path does not resolve are left untouched, as is an
/// unterminated `{`.
pub fn substitute(template: &str, state: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let path = &after_open[..close];
        // A `{` inside the token means the real token starts there
        if let Some(inner) = path.rfind('{') {
            out.push_str(&rest[open..=open + inner]);
            rest = &after_open[inner..];
            continue;
        }
        match lookup(state, path) {
            Some(Value::String(s)) => out.push_str(s),
            Some(value) => out.push_str(&value.to_string()),
            None => {
                out.push('{');
                out.push_str(path);
                out.push('}');
            }
        }
        rest = &after_open[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Walks a dot-separated path; numeric segments index into arrays.
fn lookup<'a>(state: &'a Value, path: &str) -> Option<&'a Value> {
    if path.trim().is_empty() {
        return None;
    }
    path.trim().split('.').try_fold(state, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitutes_nested_values() {
        let state = json!({
            "game_board": {"turn": 4, "pieces": [{"name": "p1"}]},
            "current_player": "ann",
        });
        assert_eq!(
            substitute("{current_player} to move, turn {game_board.turn}", &state),
            "ann to move, turn 4"
        );
        assert_eq!(substitute("{game_board.pieces.0.name}", &state), "p1");
    }

    #[test]
    fn test_unknown_and_unterminated_tokens_are_kept() {
        let state = json!({"a": 1});
        assert_eq!(substitute("x {missing} y", &state), "x {missing} y");
        assert_eq!(substitute("{} and {a", &state), "{} and {a");
        assert_eq!(substitute("plain", &state), "plain");
    }

    #[test]
    fn test_stray_open_brace_before_token() {
        let state = json!({"b": 2, "a": "x"});
        assert_eq!(substitute("{a {b}", &state), "{a 2");
        assert_eq!(substitute("{{a}}", &state), "{x}");
    }
}
