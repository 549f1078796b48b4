use serde::{Deserialize, Serialize};

/// The closing return value of a frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Digest {
    pub result: String,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub open_questions: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl Digest {
    /// Flattened plain-text projection used for keyword scoring and as the
    /// oracle's embedding input.
    pub fn as_text(&self) -> String {
        let mut parts = vec![self.result.clone()];
        parts.extend(self.decisions.iter().cloned());
        parts.extend(self.constraints.iter().cloned());
        parts.extend(self.open_questions.iter().cloned());
        parts.extend(self.next_steps.iter().cloned());
        parts.join(" ")
    }
}
