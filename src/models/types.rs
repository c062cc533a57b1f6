use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One structured generation call: a prompt and the JSON shape the answer must take
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub schema: Value,
}

impl GenerationRequest {
    /// A request constrained to the [`ChangeSet`] schema
    pub fn change_set(prompt: String) -> Self {
        Self {
            prompt,
            schema: change_set_schema(),
        }
    }
}

/// A file the model wants created or replaced, always with its full content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub name: String,
    pub content: String,
}

/// The model's answer: files to write, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub files: Vec<FileChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Output schema in the generateContent `responseSchema` dialect
pub fn change_set_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "files": {
                "type": "ARRAY",
                "description": "Files to update or create. For updates include the full new content. Only include files that have changed or are new.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {
                            "type": "STRING",
                            "description": "The file path relative to the repository root, e.g. index.html or about.html"
                        },
                        "content": {
                            "type": "STRING",
                            "description": "The complete new content of the file."
                        }
                    },
                    "required": ["name", "content"]
                }
            }
        },
        "required": ["files"]
    })
}
