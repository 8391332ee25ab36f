//! Property-based invariants of the settings store and the menu cursor.
//!
//! 1. Adjusting never leaves `[min, max]`.
//! 2. A step up followed by a step down is the identity away from the bounds.
//! 3. Advancing a selector once per option returns to the start.
//! 4. Browsing any disabled pattern terminates on an enabled node or stays put.

use proptest::prelude::*;
use thermview_core::{
    menu::{MAX_NODES, MenuAction, MenuNavigator, MenuNode, MenuState, MenuTree, NodeLabel},
    settings::{Setting, SettingKey, SettingsStore},
};

const NUMERIC: [SettingKey; 5] = [
    SettingKey::Brightness,
    SettingKey::Contrast,
    SettingKey::XOffset,
    SettingKey::YOffset,
    SettingKey::Scale,
];

fn numeric_key() -> impl Strategy<Value = SettingKey> {
    (0..NUMERIC.len()).prop_map(|i| NUMERIC[i])
}

fn raw(store: &SettingsStore, key: SettingKey) -> (i32, i32, i32) {
    match store.get(key) {
        Setting::Adjustable(v) => (v.raw(), v.raw_min(), v.raw_max()),
        Setting::Selector(_) => unreachable!("{key:?} is numeric"),
    }
}

proptest! {
    #[test]
    fn adjust_stays_in_bounds(
        key in numeric_key(),
        deltas in prop::collection::vec(-2_000i32..=2_000, 1..32),
    ) {
        let mut store = SettingsStore::new();
        for delta in deltas {
            store.adjust(key, delta).unwrap();
            let (value, min, max) = raw(&store, key);
            prop_assert!(min <= value && value <= max);
        }
    }
}

proptest! {
    #[test]
    fn inverse_steps_cancel_away_from_bounds(key in numeric_key(), start in -1_000i32..=1_000) {
        let mut store = SettingsStore::new();
        store.adjust(key, start).unwrap();
        let (before, _, max) = raw(&store, key);

        store.adjust(key, 1).unwrap();
        store.adjust(key, -1).unwrap();

        if before < max {
            prop_assert_eq!(raw(&store, key).0, before);
        }
    }
}

proptest! {
    #[test]
    fn selectors_are_cyclic(
        key in prop_oneof![Just(SettingKey::Scene), Just(SettingKey::Color)],
        skip in 0usize..10,
    ) {
        let mut store = SettingsStore::new();
        for _ in 0..skip {
            store.advance(key).unwrap();
        }
        let before = *store.get(key);
        let len = match &before {
            Setting::Selector(s) => s.options().len(),
            Setting::Adjustable(_) => unreachable!(),
        };

        for _ in 0..len {
            store.advance(key).unwrap();
        }

        prop_assert_eq!(store.get(key), &before);
    }
}

proptest! {
    #[test]
    fn rotation_terminates_for_any_disabled_pattern(
        disabled in prop::collection::vec(any::<bool>(), 1..=MAX_NODES),
        moves in prop::collection::vec(prop_oneof![Just(1i8), Just(-1i8)], 0..24),
    ) {
        let mut tree = MenuTree::new();
        let root = tree.add_menu(None).unwrap();
        for off in &disabled {
            tree.push_node(
                root,
                MenuNode::action(NodeLabel::Text("n"), MenuAction::Back).with_disabled(*off),
            )
            .unwrap();
        }

        let mut store = SettingsStore::new();
        let mut nav = MenuNavigator::new(tree);
        nav.confirm(&mut store);

        for direction in moves {
            let before = nav.state();
            nav.rotate(direction, &mut store);
            let MenuState::Browsing { selected, .. } = nav.state() else {
                panic!("rotation left browsing: {:?}", nav.state());
            };
            prop_assert!(selected < disabled.len());
            prop_assert!(!disabled[selected] || nav.state() == before);
        }
    }
}
