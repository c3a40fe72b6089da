//! # Keymap
//!
//! Key names follow the `Shift-Mod-z` convention. `Mod` is the platform's
//! command modifier: `Meta` on Mac, `Ctrl` everywhere else. Names are
//! normalized once when bound so lookups are plain string matches.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commands::{EditorAction, WrapInList};
use crate::lists::ListKind;
use crate::model::Schema;
use crate::state::{EditorState, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    #[default]
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("unrecognized modifier '{modifier}' in key name '{name}'")]
    UnknownModifier { name: String, modifier: String },
    #[error("key name '{0}' has no key")]
    MissingKey(String),
}

/// Normalize `name` to the canonical `Shift-Meta-Ctrl-Alt-key` form.
pub fn normalize_key_name(name: &str, platform: Platform) -> Result<String, KeymapError> {
    let mut parts: Vec<&str> = name.split('-').collect();
    let mut key = parts.pop().unwrap_or_default();
    if key.is_empty() {
        // `Ctrl--` binds the minus key.
        if parts.last() == Some(&"") {
            parts.pop();
            key = "-";
        } else {
            return Err(KeymapError::MissingKey(name.to_string()));
        }
    }

    let (mut shift, mut meta, mut ctrl, mut alt) = (false, false, false, false);
    for modifier in parts {
        match modifier.to_ascii_lowercase().as_str() {
            "shift" | "s" => shift = true,
            "cmd" | "meta" | "m" => meta = true,
            "ctrl" | "control" | "c" => ctrl = true,
            "alt" | "a" => alt = true,
            "mod" => match platform {
                Platform::Mac => meta = true,
                Platform::Other => ctrl = true,
            },
            _ => {
                return Err(KeymapError::UnknownModifier {
                    name: name.to_string(),
                    modifier: modifier.to_string(),
                });
            }
        }
    }
    Ok(compose_name(key, shift, meta, ctrl, alt))
}

fn compose_name(key: &str, shift: bool, meta: bool, ctrl: bool, alt: bool) -> String {
    let mut out = String::new();
    for (held, prefix) in [(shift, "Shift-"), (meta, "Meta-"), (ctrl, "Ctrl-"), (alt, "Alt-")] {
        if held {
            out.push_str(prefix);
        }
    }
    out.push_str(key);
    out
}

/// A key press as reported by the view: the base key plus held modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPress {
    pub key: String,
    pub shift: bool,
    pub meta: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn name(&self) -> String {
        let key = if self.key.chars().count() == 1 {
            self.key.to_lowercase()
        } else {
            self.key.clone()
        };
        compose_name(&key, self.shift, self.meta, self.ctrl, self.alt)
    }
}

/// Bindings from normalized key names to editor actions.
#[derive(Debug, Clone)]
pub struct Keymap {
    platform: Platform,
    bindings: HashMap<String, EditorAction>,
}

impl Keymap {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            bindings: HashMap::new(),
        }
    }

    /// History bindings plus list shortcuts for the list types `schema` has.
    pub fn with_defaults(platform: Platform, schema: &Schema) -> Result<Self, KeymapError> {
        let mut keymap = Self::new(platform);
        keymap.bind("Mod-z", EditorAction::Undo)?;
        keymap.bind("Mod-y", EditorAction::Redo)?;
        keymap.bind("Shift-Mod-z", EditorAction::Redo)?;
        for (key, kind) in [
            ("Shift-Ctrl-8", ListKind::Bullet),
            ("Shift-Ctrl-9", ListKind::Ordered),
        ] {
            if let Some(list_type) = schema.node_type(kind.node_name()) {
                keymap.bind(key, EditorAction::WrapInList(WrapInList::new(list_type, None)))?;
            }
        }
        Ok(keymap)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn bind(&mut self, name: &str, action: EditorAction) -> Result<&mut Self, KeymapError> {
        let name = normalize_key_name(name, self.platform)?;
        self.bindings.insert(name, action);
        Ok(self)
    }

    pub fn lookup(&self, key: &KeyPress) -> Option<&EditorAction> {
        self.bindings.get(&key.name())
    }

    pub fn bound_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Run the action bound to `key`. Returns whether a binding handled it.
    pub fn handle(
        &self,
        state: &EditorState,
        key: &KeyPress,
        dispatch: Option<&mut dyn FnMut(Transaction)>,
    ) -> bool {
        let Some(action) = self.lookup(key) else {
            return false;
        };
        let handled = action.execute(state, dispatch);
        debug!("Key {} -> {action:?}: handled={handled}", key.name());
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TextSelection;
    use crate::test_support::{doc, p, schema};
    use rstest::rstest;

    #[rstest]
    #[case("Mod-z", Platform::Mac, "Meta-z")]
    #[case("Mod-z", Platform::Other, "Ctrl-z")]
    #[case("Shift-Mod-z", Platform::Other, "Shift-Ctrl-z")]
    #[case("Mod-Shift-z", Platform::Mac, "Shift-Meta-z")]
    #[case("alt-ctrl-Enter", Platform::Other, "Ctrl-Alt-Enter")]
    #[case("Ctrl--", Platform::Other, "Ctrl--")]
    fn test_normalize_key_name(
        #[case] name: &str,
        #[case] platform: Platform,
        #[case] expected: &str,
    ) {
        assert_eq!(normalize_key_name(name, platform).unwrap(), expected);
    }

    #[test]
    fn test_unknown_modifier_is_rejected() {
        assert!(matches!(
            normalize_key_name("Hyper-x", Platform::Other),
            Err(KeymapError::UnknownModifier { .. })
        ));
    }

    #[test]
    fn test_mod_binding_follows_platform() {
        let schema = schema();
        let mac = Keymap::with_defaults(Platform::Mac, &schema).unwrap();
        let other = Keymap::with_defaults(Platform::Other, &schema).unwrap();

        assert!(matches!(mac.lookup(&KeyPress::new("z").meta()), Some(EditorAction::Undo)));
        assert!(mac.lookup(&KeyPress::new("z").ctrl()).is_none());
        assert!(matches!(
            other.lookup(&KeyPress::new("Z").ctrl().shift()),
            Some(EditorAction::Redo)
        ));
    }

    #[test]
    fn test_list_shortcut_wraps_paragraph() {
        let schema = schema();
        let keymap = Keymap::with_defaults(Platform::Other, &schema).unwrap();
        let state = EditorState::new(schema, doc(&[p(&["a"])]), Some(TextSelection::cursor(1)));
        let key = KeyPress::new("9").shift().ctrl();

        let mut applied = None;
        let mut dispatch = |tr: Transaction| applied = Some(state.apply(&tr));
        assert!(keymap.handle(&state, &key, Some(&mut dispatch)));

        let next = applied.unwrap();
        assert_eq!(next.doc().child(0).node_type().name(), "ordered_list");
    }

    #[test]
    fn test_unbound_key_is_not_handled() {
        let schema = schema();
        let keymap = Keymap::with_defaults(Platform::Other, &schema).unwrap();
        let state = EditorState::new(schema, doc(&[p(&["a"])]), None);
        assert!(!keymap.handle(&state, &KeyPress::new("q").ctrl(), None));
    }
}
