use serde_json::{Map, Value};

use crate::Error;

/// One step into a provider JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment {
    Key(&'static str),
    Index(usize),
}

/// Walk `path` in `value` and return the string found at the end.
///
/// Fails with [`Error::MalformedResponse`] naming the path up to the first
/// segment that is missing, or the full path when the leaf is not a string.
pub(crate) fn text_at(provider: &str, value: &Value, path: &[Segment]) -> Result<String, Error> {
    let mut current = value;
    let mut walked = String::new();

    for segment in path {
        let next = match *segment {
            Segment::Key(key) => {
                if !walked.is_empty() {
                    walked.push('.');
                }
                walked.push_str(key);
                current.get(key)
            }
            Segment::Index(index) => {
                walked.push_str(&format!("[{index}]"));
                current.get(index)
            }
        };
        current = next.ok_or_else(|| Error::malformed(provider, walked.as_str()))?;
    }

    current
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| Error::malformed(provider, walked))
}

/// Shallow merge: caller parameters replace same-named defaults wholesale.
pub(crate) fn overlay(mut defaults: Map<String, Value>, parameters: &Map<String, Value>) -> Value {
    for (key, value) in parameters {
        defaults.insert(key.clone(), value.clone());
    }
    Value::Object(defaults)
}
