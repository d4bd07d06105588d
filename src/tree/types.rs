//! Type identities as spelled by the loader
//!
//! Named types are fully qualified (`emitter/types.MetricEmitterFn`), pointers
//! carry a leading `*`, generic instantiations a trailing `[...]`, and
//! collections are spelled `[]T`, `[N]T` or `map[K]V`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity used for matching: pointers and generic arguments removed.
    ///
    /// `*emitter.Emitter` -> `emitter.Emitter`,
    /// `types.MetricsTimer[int]` -> `types.MetricsTimer`.
    /// Collection types are returned unchanged apart from the pointer.
    pub fn origin(&self) -> &str {
        let name = self.0.trim_start_matches('*');
        if name.starts_with('[') || name.starts_with("map[") {
            return name;
        }
        match name.find('[') {
            Some(idx) => &name[..idx],
            None => name,
        }
    }

    /// Element type of a slice, array or map type
    pub fn element(&self) -> Option<TypeName> {
        let name = self.0.trim_start_matches('*');
        let open = if name.starts_with('[') {
            0
        } else if name.starts_with("map[") {
            3
        } else {
            return None;
        };
        let close = matching_bracket(name, open)?;
        let rest = &name[close + 1..];
        if rest.is_empty() {
            None
        } else {
            Some(TypeName::new(rest))
        }
    }

    pub fn is_collection(&self) -> bool {
        self.element().is_some()
    }
}

fn matching_bracket(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
