//! Language detection from file extensions

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Languages recognised by the scanner. Only Python is analysed further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Java,
    Go,
    Rust,
    C,
    Cpp,
    Unknown,
}

impl Language {
    /// Detect language from file path
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "py" => Language::Python,
            "ts" | "tsx" => Language::TypeScript,
            "js" | "jsx" => Language::JavaScript,
            "java" => Language::Java,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "c" => Language::C,
            "cpp" => Language::Cpp,
            _ => Language::Unknown,
        }
    }

    /// Get the language name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Unknown => "unknown",
        }
    }

    pub fn is_python(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
