//! Module/package graph for visualization front-ends

use serde::{Deserialize, Serialize};

use super::model::RepoFacts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisualNode {
    Module {
        id: String,
        name: String,
        full_name: String,
        classes: usize,
        functions: usize,
        imports: usize,
    },
    Package {
        id: String,
        name: String,
        full_name: String,
        modules: usize,
    },
}

impl VisualNode {
    pub fn id(&self) -> &str {
        match self {
            VisualNode::Module { id, .. } | VisualNode::Package { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualEdgeKind {
    Import,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: VisualEdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualStats {
    pub total_files: usize,
    pub python_files: usize,
    pub modules: usize,
    pub packages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualFacts {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    pub stats: VisualStats,
}

fn package_node_id(package: &str) -> String {
    format!("pkg_{}", package)
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Module and package nodes with import and containment edges.
///
/// Top-level units (package key `""`) get no package node.
pub fn visual_facts(facts: &RepoFacts) -> VisualFacts {
    let mut nodes: Vec<VisualNode> = facts
        .modules
        .iter()
        .map(|m| VisualNode::Module {
            id: m.module.clone(),
            name: last_segment(&m.module).to_string(),
            full_name: m.module.clone(),
            classes: m.classes.len(),
            functions: m.functions.len(),
            imports: m.imports.len(),
        })
        .collect();

    let packages: Vec<_> = facts
        .packages
        .values()
        .filter(|p| !p.package.is_empty())
        .collect();

    for package in &packages {
        nodes.push(VisualNode::Package {
            id: package_node_id(&package.package),
            name: last_segment(&package.package).to_string(),
            full_name: package.package.clone(),
            modules: package.modules.len(),
        });
    }

    let mut edges: Vec<VisualEdge> = facts
        .dependencies
        .iter()
        .map(|dep| VisualEdge {
            source: dep.from_module.clone(),
            target: dep.to_module.clone(),
            kind: VisualEdgeKind::Import,
        })
        .collect();

    for package in &packages {
        for module in &package.modules {
            edges.push(VisualEdge {
                source: package_node_id(&package.package),
                target: module.module.clone(),
                kind: VisualEdgeKind::Contains,
            });
        }
    }

    let stats = VisualStats {
        total_files: facts.files.len(),
        python_files: facts.python_file_count(),
        modules: facts.modules.len(),
        packages: packages.len(),
    };

    VisualFacts {
        nodes,
        edges,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SourceUnit;
    use crate::facts::aggregate::analyze_units;

    fn sample() -> RepoFacts {
        let units = vec![
            SourceUnit::new("main", "main.py", "import app.core.engine\n"),
            SourceUnit::new("app.core.engine", "app/core/engine.py", "class Engine:\n    pass\n"),
        ];
        analyze_units("/repo", Vec::new(), &units).result.facts
    }

    #[test]
    fn test_nodes_and_edges() {
        let visual = visual_facts(&sample());

        let ids: Vec<_> = visual.nodes.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["main", "app.core.engine", "pkg_app.core"]);

        assert_eq!(
            visual.nodes[1],
            VisualNode::Module {
                id: "app.core.engine".to_string(),
                name: "engine".to_string(),
                full_name: "app.core.engine".to_string(),
                classes: 1,
                functions: 0,
                imports: 0,
            }
        );

        assert_eq!(visual.edges.len(), 2);
        assert_eq!(visual.edges[0].kind, VisualEdgeKind::Import);
        assert_eq!(visual.edges[0].source, "main");
        assert_eq!(visual.edges[1].kind, VisualEdgeKind::Contains);
        assert_eq!(visual.edges[1].source, "pkg_app.core");

        assert_eq!(visual.stats.modules, 2);
        assert_eq!(visual.stats.packages, 1);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(visual_facts(&sample())).unwrap();

        assert_eq!(json["nodes"][2]["type"], "package");
        assert_eq!(json["nodes"][2]["name"], "core");
        assert_eq!(json["nodes"][2]["modules"], 1);
        assert_eq!(json["edges"][0]["type"], "import");
        assert_eq!(json["stats"]["total_files"], 0);
    }
}
