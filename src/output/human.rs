//! Human-readable output formatting

use super::{PathsView, ReachableView};

/// Reachable nodes, indented by depth
pub fn format_reachable(view: &ReachableView) -> String {
    let mut output = String::new();

    if !view.found {
        output.push_str(&format!("Symbol '{}' not found in call graph\n", view.symbol));
        return output;
    }

    output.push_str(&format!(
        "Call graph from '{}' (max depth {}): {} nodes, {} edges\n\n",
        view.symbol,
        view.max_depth,
        view.nodes.len(),
        view.edges.len()
    ));

    for node in &view.nodes {
        let depth = node.depth.unwrap_or(0);
        output.push_str(&format!(
            "{}{} [{}] {}:{}\n",
            "  ".repeat(depth + 1),
            node.id,
            node.kind.as_str(),
            node.defining_unit,
            node.line
        ));
    }

    output
}

/// Numbered list of paths
pub fn format_paths(view: &PathsView) -> String {
    let mut output = String::new();

    if !view.found {
        output.push_str(&format!(
            "No call graph node for '{}' or '{}'\n",
            view.start, view.end
        ));
        return output;
    }

    if view.paths.is_empty() {
        output.push_str(&format!(
            "No paths from '{}' to '{}' within {} calls\n",
            view.start, view.end, view.max_depth
        ));
        return output;
    }

    output.push_str(&format!(
        "Found {} paths from '{}' to '{}' (max depth {})\n\n",
        view.paths.len(),
        view.start,
        view.end,
        view.max_depth
    ));

    for (i, path) in view.paths.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, path.join(" -> ")));
    }

    output
}
