//! Textual summaries of modules, packages and the repository

use std::collections::BTreeMap;

use super::model::{PackageFacts, RepoFacts, Summaries};
use crate::extract::ModuleFacts;

/// Imports listed in a module summary
const SUMMARY_IMPORT_LIMIT: usize = 10;

pub fn summarize_module(facts: &ModuleFacts) -> String {
    let mut parts = vec![format!("Module {} at {}", facts.module, facts.path)];

    if !facts.classes.is_empty() {
        let names: Vec<&str> = facts.classes.iter().map(|c| c.name.as_str()).collect();
        parts.push(format!("  Classes: {}", names.join(", ")));
    }
    if !facts.functions.is_empty() {
        let names: Vec<&str> = facts.functions.iter().map(|f| f.name.as_str()).collect();
        parts.push(format!("  Functions: {}", names.join(", ")));
    }
    if !facts.imports.is_empty() {
        let mut imports: Vec<&str> = facts.imports.iter().map(String::as_str).collect();
        imports.sort_unstable();
        imports.truncate(SUMMARY_IMPORT_LIMIT);
        parts.push(format!("  Imports: {}", imports.join(", ")));
    }

    parts.join("\n")
}

pub fn summarize_package(package: &PackageFacts) -> String {
    format!(
        "Package {}: {} modules, {} classes, {} functions",
        package.package,
        package.modules.len(),
        package.class_count(),
        package.function_count()
    )
}

pub fn summarize_repo(facts: &RepoFacts) -> Summaries {
    let per_module: BTreeMap<String, String> = facts
        .modules
        .iter()
        .map(|m| (m.module.clone(), summarize_module(m)))
        .collect();

    let per_package: BTreeMap<String, String> = facts
        .packages
        .iter()
        .map(|(key, package)| (key.clone(), summarize_package(package)))
        .collect();

    let global_overview = format!(
        "Repository at {}: {} files, {} python files, {} python modules",
        facts.root,
        facts.files.len(),
        facts.python_file_count(),
        facts.modules.len()
    );

    Summaries {
        global_overview,
        per_package,
        per_module,
    }
}
