//! Repository-level fact types
//!
//! Field names are snake_case and stable; they form the facts JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::{ModuleFacts, ParseError};
use crate::scan::{Language, ScannedFile};

/// A scanned file as reported in the facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub rel_path: String,
    pub language: Language,
    pub package: Option<String>,
    pub module: Option<String>,
}

impl From<&ScannedFile> for FileInfo {
    fn from(file: &ScannedFile) -> Self {
        Self {
            path: file.path.to_string_lossy().into_owned(),
            rel_path: file.rel_path.clone(),
            language: file.language,
            package: file.package.clone(),
            module: file.module.clone(),
        }
    }
}

/// Units grouped under one package key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFacts {
    pub package: String,
    pub modules: Vec<ModuleFacts>,
}

impl PackageFacts {
    pub fn class_count(&self) -> usize {
        self.modules.iter().map(|m| m.classes.len()).sum()
    }

    pub fn function_count(&self) -> usize {
        self.modules.iter().map(|m| m.functions.len()).sum()
    }
}

/// `from_module` imports `to_module`, both known units
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from_module: String,
    pub to_module: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFacts {
    pub root: String,
    pub files: Vec<FileInfo>,
    pub modules: Vec<ModuleFacts>,
    pub packages: BTreeMap<String, PackageFacts>,
    pub dependencies: Vec<DependencyEdge>,
}

impl RepoFacts {
    pub fn python_file_count(&self) -> usize {
        self.files.iter().filter(|f| f.language.is_python()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summaries {
    pub global_overview: String,
    pub per_package: BTreeMap<String, String>,
    pub per_module: BTreeMap<String, String>,
}

// =============================================================================
// FAILURES & DIAGNOSTICS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Parse,
    Read,
    /// Over the configured size limit; never read
    TooLarge,
}

/// A unit left out of the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub module: String,
    pub path: String,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
}

impl UnitFailure {
    pub fn parse(module: &str, err: &ParseError) -> Self {
        Self {
            module: module.to_string(),
            path: err.path.clone(),
            kind: FailureKind::Parse,
            line: err.line,
            message: err.message.clone(),
        }
    }

    pub fn read(module: &str, path: &str, message: impl Into<String>) -> Self {
        Self {
            module: module.to_string(),
            path: path.to_string(),
            kind: FailureKind::Read,
            line: None,
            message: message.into(),
        }
    }

    pub fn too_large(module: &str, path: &str, size: u64) -> Self {
        Self {
            module: module.to_string(),
            path: path.to_string(),
            kind: FailureKind::TooLarge,
            line: None,
            message: format!("File is {} bytes, over the size limit", size),
        }
    }
}

/// Counters for one analysis run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub units_analyzed: usize,
    pub units_failed: usize,
    pub symbol_collisions: usize,
    pub call_sites: usize,
    pub unresolved_calls: usize,
    pub call_edges: usize,
}

/// Facts, summaries and per-unit failures for a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub facts: RepoFacts,
    pub summaries: Summaries,
    #[serde(default)]
    pub failures: Vec<UnitFailure>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}
