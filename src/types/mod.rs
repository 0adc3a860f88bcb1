use serde::Deserialize;

// ===================================================================
// Hook input (received via stdin, snake_case JSON)
// ===================================================================

/// The `UserPromptSubmit` envelope as far as this hook cares about it.
///
/// The host sends more fields (`session_id`, `transcript_path`, `cwd`,
/// `hook_event_name`, ...). They are accepted and ignored; only the prompt
/// drives the pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub prompt: String,
}

impl HookInput {
    /// Parse the stdin envelope. Only a JSON object is an envelope: scalars
    /// and arrays are rejected, even though serde would read `["text"]` as a
    /// struct.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<serde_json::Value>(raw)? {
            envelope @ serde_json::Value::Object(_) => serde_json::from_value(envelope),
            _ => Err(serde::de::Error::custom("hook input must be a JSON object")),
        }
    }
}

// ===================================================================
// Hook output (written to stdout)
// ===================================================================

pub const OPEN_MARKER: &str = "[PROMPT-KONTEXT von Haiku]";
pub const CLOSE_MARKER: &str = "[/PROMPT-KONTEXT]";

/// Wrap a refinement note in the delimiter block the host prepends to the
/// prompt.
pub fn augmentation_block(note: &str) -> String {
    format!("{OPEN_MARKER}\n{note}\n{CLOSE_MARKER}")
}
