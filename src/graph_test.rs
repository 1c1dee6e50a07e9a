use super::*;
use crate::doc::LineKind;

fn index() -> AdjacencyIndex {
    AdjacencyIndex::build(&[
        Line::new("a", LineKind::Uses, "b"),
        Line::new("b", LineKind::Supports, "c"),
        Line::new("c", LineKind::Relates, "a"),
        Line::new("a", LineKind::Inspires, "b"),
        Line::new("d", LineKind::Uses, "ghost"),
    ])
}

#[test]
fn adjacency_is_symmetric() {
    let idx = index();
    assert!(idx.connected_to("a").contains("b"));
    assert!(idx.connected_to("b").contains("a"));
    assert!(idx.connected_to("c").contains("a"));
}

#[test]
fn parallel_lines_count_once() {
    assert_eq!(index().connected_to("a").len(), 2);
}

#[test]
fn neighborhood_includes_self() {
    let n = index().neighborhood("b");
    let mut ids: Vec<_> = n.iter().map(String::as_str).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[test]
fn unknown_card_has_no_neighbors() {
    let idx = index();
    assert!(idx.connected_to("zzz").is_empty());
    assert!(!idx.has_connections("zzz"));
    assert_eq!(idx.neighborhood("zzz").len(), 1);
}

#[test]
fn dangling_endpoint_still_connects_known_card() {
    let idx = index();
    assert!(idx.has_connections("d"));
    assert!(idx.connected_to("d").contains("ghost"));
}

#[test]
fn empty_index() {
    let idx = AdjacencyIndex::build(&[]);
    assert!(!idx.has_connections("a"));
}
