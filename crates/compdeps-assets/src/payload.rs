//! Loader payloads.
//!
//! A [`Payload`] is the ordered list of instructions the rewriter hands to
//! the client loader: mark assets already present, load missing ones, and
//! call component initializers. It renders to executable JS statements for
//! the browser and round-trips through JSON for non-browser consumers.
//! Every instruction is idempotent, so a payload may safely run more than
//! once.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use compdeps_core::DepsError;

use crate::asset::AssetKind;

/// The JS expression the generated statements call into.
pub const MANAGER_GLOBAL: &str = "Components.manager";

/// One loader call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// `markScriptLoaded(kind, id)`: the resource is already in the document.
    MarkLoaded {
        /// JS or CSS.
        kind: AssetKind,
        /// Resource identifier (URL).
        id: String,
    },
    /// `loadScript(kind, tag)`: insert the tag unless already loaded.
    Load {
        /// JS or CSS.
        kind: AssetKind,
        /// Full `<script>` or `<link>` markup.
        tag: String,
    },
    /// `callComponent(name, instanceId, inputId)`.
    Call {
        /// Component name the initializer was registered under.
        name: String,
        /// Rendered instance id.
        instance_id: String,
        /// Data factory id, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_id: Option<String>,
        /// Resource ids of the component's scripts. Consumers that track
        /// per-resource completion wait only for these; the generated JS
        /// waits for every script in the payload instead.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        deps: Vec<String>,
    },
}

impl Instruction {
    /// Renders this instruction as one JS statement.
    pub fn to_js(&self) -> String {
        match self {
            Self::MarkLoaded { kind, id } => format!(
                "{MANAGER_GLOBAL}.markScriptLoaded({}, {});",
                js_string(kind.script_type()),
                js_string(id)
            ),
            Self::Load { kind, tag } => format!(
                "{MANAGER_GLOBAL}.loadScript({}, {});",
                js_string(kind.script_type()),
                js_string(tag)
            ),
            Self::Call {
                name,
                instance_id,
                input_id,
                ..
            } => format!(
                "{MANAGER_GLOBAL}.callComponent({}, {}, {});",
                js_string(name),
                js_string(instance_id),
                input_id.as_deref().map_or_else(|| "null".to_string(), js_string)
            ),
        }
    }
}

/// Encodes `s` as a JS string literal that is also safe inside `<script>`.
fn js_string(s: &str) -> String {
    let quoted = serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
    quoted.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// An ordered list of loader instructions.
///
/// # Examples
///
/// ```
/// use compdeps_assets::asset::AssetKind;
/// use compdeps_assets::payload::{Instruction, Payload};
///
/// let mut payload = Payload::new();
/// payload.push(Instruction::MarkLoaded { kind: AssetKind::Style, id: "/a.css".into() });
/// assert!(payload.to_js().contains(r#"markScriptLoaded("css", "/a.css")"#));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    instructions: Vec<Instruction>,
}

impl Payload {
    /// Creates an empty payload.
    pub const fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    /// Appends an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// The instructions, in order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterates over the instructions.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the payload has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Renders the statements wrapped in an IIFE.
    pub fn to_js(&self) -> String {
        let mut out = String::from("(function () {\n");
        for instruction in &self.instructions {
            let _ = writeln!(out, "  {}", instruction.to_js());
        }
        out.push_str("})();");
        out
    }

    /// Renders the payload as a complete `<script>` element.
    pub fn to_script_tag(&self) -> String {
        format!("<script>{}</script>", self.to_js())
    }

    /// Serializes the payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error if serialization fails.
    pub fn to_json(&self) -> Result<String, DepsError> {
        serde_json::to_string(self).map_err(|e| DepsError::Serialization(e.to_string()))
    }

    /// Parses a payload from JSON.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error if the JSON is not a valid payload.
    pub fn from_json(json: &str) -> Result<Self, DepsError> {
        serde_json::from_str(json).map_err(|e| DepsError::Serialization(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<Instruction> for Payload {
    fn extend<I: IntoIterator<Item = Instruction>>(&mut self, iter: I) {
        self.instructions.extend(iter);
    }
}

impl FromIterator<Instruction> for Payload {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}
