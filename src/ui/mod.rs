use crate::app::AppConfig;
use crate::tree::MapTree;

/// Text summary of a loaded map for headless runs.
pub fn render_preview(tree: &MapTree, config: &AppConfig) {
    println!(
        "Loaded mind map \"{}\" with {} node(s), depth {}.",
        tree.root().name,
        tree.reachable_count(),
        tree.max_reachable_depth()
    );
    println!(
        "Total estimation: {} (canvas {}x{} px).",
        tree.aggregate_estimation(tree.root),
        config.width,
        config.height
    );

    let top_level = &tree.root().children;
    for &child in top_level.iter().take(5) {
        println!(
            "- {} => {}",
            tree.label(child),
            tree.aggregate_estimation(child)
        );
    }
    if top_level.len() > 5 {
        println!("... ({} more item(s) omitted)", top_level.len() - 5);
    }
}
