//! Symbol Table
//!
//! Repository-wide index from qualified declaration name to metadata.
//! Names are not scoped: a later declaration with the same name replaces
//! the earlier one. Replacements are counted so callers can judge how much
//! to trust name-based resolution.
//!
//! @module graph/symbols

use std::collections::HashMap;

use serde::Serialize;

use crate::extract::{Declaration, DeclarationKind, ModuleFacts};

/// Metadata recorded for a qualified name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
    pub kind: DeclarationKind,
    pub unit: String,
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl From<&Declaration> for SymbolEntry {
    fn from(decl: &Declaration) -> Self {
        Self {
            kind: decl.kind,
            unit: decl.unit.clone(),
            path: decl.path.clone(),
            start_line: decl.start_line,
            end_line: decl.end_line,
        }
    }
}

/// Last-write-wins map of qualified name -> declaration metadata
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolEntry>,
    collisions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a declaration, returning the entry it replaced.
    pub fn insert(&mut self, decl: &Declaration) -> Option<SymbolEntry> {
        let previous = self.entries.insert(decl.name.clone(), SymbolEntry::from(decl));
        if previous.is_some() {
            self.collisions += 1;
        }
        previous
    }

    /// Insert every declaration of a unit
    pub fn insert_module(&mut self, facts: &ModuleFacts) {
        for decl in facts.declarations() {
            self.insert(&decl);
        }
    }

    pub fn from_modules<'a>(modules: impl IntoIterator<Item = &'a ModuleFacts>) -> Self {
        let mut table = Self::new();
        for facts in modules {
            table.insert_module(facts);
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of inserts that replaced an existing name
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolEntry)> {
        self.entries.iter()
    }
}
