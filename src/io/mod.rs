use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::MindTreeError;
use crate::tree::{MapTree, NodeId};

pub const DOCUMENT_MIME_TYPE: &str = "application/json";
pub const DEFAULT_FILE_STEM: &str = "mindMap";

/// Plain document tree as persisted on disk.
///
/// `estimation` is preserved on export; documents written by the legacy tool
/// lack the field and load with zeros. Collapse state is not persisted, so a
/// reloaded map always opens fully expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDocument {
    pub name: String,
    #[serde(default)]
    pub estimation: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MapDocument>,
}

/// What the save boundary hands to the file-write mechanism.
#[derive(Debug, Clone)]
pub struct SavePayload {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

/// Exports the subtree under `id`, reading through collapsed and expanded
/// child lists alike so a save is loss-free with respect to structure.
pub fn serialize(tree: &MapTree, id: NodeId) -> MapDocument {
    let node = &tree.nodes[id];
    MapDocument {
        name: node.name.clone(),
        estimation: node.estimation,
        children: node
            .children
            .iter()
            .map(|&child| serialize(tree, child))
            .collect(),
    }
}

/// Rebuilds a live tree from a document, assigning depth top-down from zero
/// and parent back-references as it goes.
pub fn deserialize(document: &MapDocument) -> MapTree {
    let mut tree = MapTree::new_document();
    {
        let root = &mut tree.nodes[tree.root];
        root.name = document.name.clone();
        root.estimation = document.estimation;
    }
    let root = tree.root;
    for child in &document.children {
        attach(&mut tree, root, child);
    }
    tree
}

fn attach(tree: &mut MapTree, parent: NodeId, document: &MapDocument) {
    let id = tree.add_child(parent);
    {
        let node = &mut tree.nodes[id];
        node.name = document.name.clone();
        node.estimation = document.estimation;
    }
    for child in &document.children {
        attach(tree, id, child);
    }
}

/// Parses raw document text. The caller replaces its live tree only on
/// success, so a malformed file never corrupts the current map.
pub fn parse_document(contents: &str) -> std::result::Result<MapTree, MindTreeError> {
    let document: MapDocument = serde_json::from_str(contents)
        .map_err(|err| MindTreeError::MalformedDocument(err.to_string()))?;
    Ok(deserialize(&document))
}

/// Serializes the whole map into the payload the download/write mechanism
/// consumes.
pub fn save_payload(tree: &MapTree, file_stem: &str) -> Result<SavePayload> {
    let document = serialize(tree, tree.root);
    let content =
        serde_json::to_string(&document).context("failed to encode mind map as JSON")?;
    Ok(SavePayload {
        filename: format!("{file_stem}.json"),
        mime_type: DOCUMENT_MIME_TYPE,
        content,
    })
}

pub fn load_map(path: &Path) -> Result<MapTree> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read map file: {}", path.display()))?;
    let tree = parse_document(&raw)
        .with_context(|| format!("failed to parse map file: {}", path.display()))?;
    Ok(tree)
}

pub fn save_map(path: &Path, tree: &MapTree) -> Result<()> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_FILE_STEM);
    let payload = save_payload(tree, stem)?;
    fs::write(path, payload.content)
        .with_context(|| format!("failed to write map file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> MapTree {
        let mut tree = MapTree::new_document();
        let a = tree.add_child(tree.root);
        let b = tree.add_child(tree.root);
        let a1 = tree.add_child(a);
        tree.apply_edit(a, Some("backend"), None).unwrap();
        tree.apply_edit(b, Some("frontend"), Some("3")).unwrap();
        tree.apply_edit(a1, Some("api"), Some("5")).unwrap();
        tree
    }

    fn shape(document: &MapDocument) -> (String, i64, Vec<(String, i64)>) {
        (
            document.name.clone(),
            document.estimation,
            document
                .children
                .iter()
                .map(|c| (c.name.clone(), c.estimation))
                .collect(),
        )
    }

    #[test]
    fn round_trip_preserves_names_structure_and_estimates() {
        let tree = sample_tree();
        let document = serialize(&tree, tree.root);
        let rebuilt = deserialize(&document);

        assert_eq!(rebuilt.reachable_count(), tree.reachable_count());
        assert_eq!(rebuilt.root().name, "root");
        assert_eq!(rebuilt.aggregate_estimation(rebuilt.root), 8);

        let again = serialize(&rebuilt, rebuilt.root);
        assert_eq!(shape(&document), shape(&again));
        assert_eq!(
            serde_json::to_string(&document).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }

    #[test]
    fn collapsed_subtrees_are_still_exported() {
        let mut tree = sample_tree();
        tree.collapse_all(tree.root);
        let document = serialize(&tree, tree.root);
        assert_eq!(document.children.len(), 2);
        assert_eq!(document.children[0].children.len(), 1);

        // Collapse state itself is not persisted: a reload opens expanded.
        let rebuilt = deserialize(&document);
        assert_eq!(rebuilt.visible_nodes().len(), 4);
    }

    #[test]
    fn deserialize_assigns_depths_and_parents() {
        let tree = sample_tree();
        let rebuilt = deserialize(&serialize(&tree, tree.root));

        for node in &rebuilt.nodes {
            match node.parent {
                Some(parent) => assert_eq!(node.depth, rebuilt.nodes[parent].depth + 1),
                None => assert_eq!(node.depth, 0),
            }
        }
    }

    #[test]
    fn legacy_document_without_estimations_loads_with_zeros() {
        let raw = r#"{"name":"root","children":[{"name":"a"},{"name":"b","children":[{"name":"c"}]}]}"#;
        let tree = parse_document(raw).unwrap();
        assert_eq!(tree.reachable_count(), 4);
        assert_eq!(tree.aggregate_estimation(tree.root), 0);
    }

    #[test]
    fn leaf_nodes_serialize_without_children_key() {
        let tree = MapTree::new_document();
        let payload = save_payload(&tree, DEFAULT_FILE_STEM).unwrap();
        assert_eq!(payload.filename, "mindMap.json");
        assert_eq!(payload.mime_type, "application/json");
        assert!(!payload.content.contains("children"));
    }

    #[test]
    fn failed_root_removal_leaves_serialized_form_unchanged() {
        let mut tree = sample_tree();
        let before = serde_json::to_string(&serialize(&tree, tree.root)).unwrap();
        assert!(tree.remove(tree.root).is_err());
        let after = serde_json::to_string(&serialize(&tree, tree.root)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn invalid_json_is_a_malformed_document() {
        let err = parse_document("{not json").unwrap_err();
        assert!(matches!(err, MindTreeError::MalformedDocument(_)));
    }

    #[test]
    fn missing_name_is_a_malformed_document() {
        let err = parse_document(r#"{"children":[]}"#).unwrap_err();
        assert!(matches!(err, MindTreeError::MalformedDocument(_)));

        let err = parse_document(r#"{"name":"ok","children":[{"estimation":2}]}"#).unwrap_err();
        assert!(matches!(err, MindTreeError::MalformedDocument(_)));
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(parse_document("[1,2,3]").is_err());
        assert!(parse_document("\"name\"").is_err());
    }

    #[test]
    fn save_and_load_files_round_trip() {
        let tree = sample_tree();
        let dir = std::env::temp_dir().join("mindtree-io-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("map.json");

        save_map(&path, &tree).unwrap();
        let loaded = load_map(&path).unwrap();
        assert_eq!(loaded.reachable_count(), 4);
        assert_eq!(loaded.aggregate_estimation(loaded.root), 8);

        std::fs::remove_file(&path).unwrap();
    }
}
