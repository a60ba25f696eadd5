use asset_tree::{Mapping, Node, OverrideState};
use proptest::prelude::*;

fn keys(node: &Node) -> Vec<String> {
    node.as_mapping()
        .unwrap()
        .keys()
        .map(str::to_string)
        .collect()
}

proptest! {
    #[test]
    fn prop_remove_keeps_relative_order(
        raw in prop::collection::btree_set("[A-Z][a-z]{1,6}", 1..12),
        pick in any::<prop::sample::Index>(),
    ) {
        let names: Vec<String> = raw.into_iter().collect();
        let map: Mapping = names.iter().map(|k| (k.clone(), Node::scalar("v"))).collect();
        let mut node = Node::from(map);

        let victim = names[pick.index(names.len())].clone();
        node.remove(&victim);

        let expected: Vec<String> = names.into_iter().filter(|k| *k != victim).collect();
        prop_assert_eq!(keys(&node), expected);
    }

    #[test]
    fn prop_set_existing_never_reorders(
        raw in prop::collection::btree_set("[A-Z][a-z]{1,6}", 1..12),
        pick in any::<prop::sample::Index>(),
        text in "[a-z0-9.]{0,8}",
    ) {
        let names: Vec<String> = raw.into_iter().collect();
        let map: Mapping = names.iter().map(|k| (k.clone(), Node::scalar("v"))).collect();
        let mut node = Node::from(map);

        let target = names[pick.index(names.len())].clone();
        node.set(target.clone(), Node::scalar(text.clone())).unwrap();

        prop_assert_eq!(keys(&node), names);
        prop_assert_eq!(node.get(&target).unwrap().as_scalar_text().unwrap(), text.as_str());
    }

    #[test]
    fn prop_removed_key_leaves_no_annotation(
        raw in prop::collection::btree_set("[A-Z][a-z]{1,6}", 1..8),
    ) {
        let names: Vec<String> = raw.into_iter().collect();
        let mut node = Node::mapping();
        for name in &names {
            node.set(name.clone(), Node::scalar("v")).unwrap();
            node.set_override(name, OverrideState::New).unwrap();
        }
        for name in &names {
            node.remove(name);
        }
        prop_assert_eq!(node.as_mapping().unwrap().overrides().count(), 0);
    }
}
