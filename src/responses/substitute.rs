use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Substituted {
    pub text: String,
    /// Well-formed `{placeholder}` names with no matching slot. Left as
    /// literals in `text`, never blanked; the caller decides whether to
    /// log or fall back.
    pub unresolved: Vec<String>,
}

fn render_slot_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Replaces `{slot_name}` placeholders with tracker slot values.
/// Malformed braces and unknown placeholders stay literal; only the
/// latter are reported as unresolved.
pub fn substitute_slots(text: &str, slots: &BTreeMap<String, Value>) -> Substituted {
    let mut out = String::with_capacity(text.len());
    let mut unresolved = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) if is_placeholder_name(&after_open[..close]) => {
                let name = &after_open[..close];
                match slots.get(name) {
                    Some(value) => out.push_str(&render_slot_value(value)),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                        unresolved.push(name.to_string());
                    }
                }
                rest = &after_open[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after_open;
            }
        }
    }
    out.push_str(rest);

    Substituted {
        text: out,
        unresolved,
    }
}
