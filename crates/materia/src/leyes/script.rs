//! Scripted behavior.
//!
//! - [`CreativeScript`] points at a script source file. Hydration loads the
//!   text and extracts its `public <type> <name>;` declarations so tools can
//!   show assignable fields.
//! - [`CustomComponent`] is behavior described by data: a
//!   [`CustomComponentDefinition`] (transpiled code plus metadata) authored
//!   outside the scene, looked up by name in a [`CustomDefinitionTable`]
//!   when the scene loads. Only the name and the instance's public variable
//!   values are saved.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::asset::ResourceState;

// ── CreativeScript ───────────────────────────────────────────────────────

/// A `public <type> <name>;` declaration found in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicVar {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

static PUBLIC_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"public\s+(\w+)\s+(\w+)\s*;").ok());

/// Extract public variable declarations, in source order.
pub fn parse_public_vars(code: &str) -> Vec<PublicVar> {
    let Some(re) = PUBLIC_VAR.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(code)
        .map(|caps| PublicVar {
            ty: caps[1].to_string(),
            name: caps[2].to_string(),
        })
        .collect()
}

/// Script text resolved during hydration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSource {
    pub text: String,
    pub public_vars: Vec<PublicVar>,
}

impl ScriptSource {
    pub fn new(text: String) -> Self {
        let public_vars = parse_public_vars(&text);
        Self { text, public_vars }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreativeScript {
    /// Project path of the script source.
    pub script_name: String,
    /// Values assigned to the script's public variables in the editor.
    pub public_var_references: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    pub source: ResourceState<ScriptSource>,
}

impl CreativeScript {
    pub fn new(script_name: impl Into<String>) -> Self {
        Self {
            script_name: script_name.into(),
            ..Default::default()
        }
    }

    /// Public variables declared by the loaded source. Empty until hydrated.
    pub fn public_vars(&self) -> &[PublicVar] {
        self.source.get().map(|s| s.public_vars.as_slice()).unwrap_or_default()
    }

    pub(crate) fn reset_runtime(&mut self) {
        self.source = ResourceState::Unloaded;
    }
}

// ── CustomComponent ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomComponentDefinition {
    pub name: String,
    pub transpiled_code: String,
    pub metadata: serde_json::Value,
}

/// Custom component definitions by name, supplied by whoever loads a scene.
#[derive(Debug, Clone, Default)]
pub struct CustomDefinitionTable {
    definitions: HashMap<String, Arc<CustomComponentDefinition>>,
}

impl CustomDefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, replacing any previous one with the same name.
    pub fn insert(&mut self, definition: CustomComponentDefinition) {
        self.definitions
            .insert(definition.name.clone(), Arc::new(definition));
    }

    pub fn with(mut self, definition: CustomComponentDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<CustomComponentDefinition>> {
        self.definitions.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// An instance of a data-described component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomComponent {
    pub definition_name: String,
    pub public_vars: serde_json::Map<String, serde_json::Value>,
    /// The bound definition. Set by the loader; never saved.
    #[serde(skip)]
    pub definition: Option<Arc<CustomComponentDefinition>>,
}

impl CustomComponent {
    pub fn new(definition: Arc<CustomComponentDefinition>) -> Self {
        Self {
            definition_name: definition.name.clone(),
            public_vars: serde_json::Map::new(),
            definition: Some(definition),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.definition.is_some()
    }
}
