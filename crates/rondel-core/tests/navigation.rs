mod common;

use common::{Fixture, folder, leaf};
use rondel_core::{KeyInput, MenuEvent, Modifiers, MouseButton};

fn nested() -> Fixture {
    let mut deep = leaf("htop");
    deep.set_trigger(Some('h'));
    Fixture::new(&[
        ("1", leaf("firefox")),
        ("3", folder()),
        ("3/0", leaf("gimp")),
        ("3/4", folder()),
        ("3/4/7", deep),
        ("5", folder()),
        ("5/2", leaf("blender")),
    ])
}

#[test]
fn test_hovering_folders_walks_down_the_tree() {
    let mut f = nested();
    f.menu.open();

    f.menu.pointer_move(f.at(1, 3));
    let level2 = f.menu.ring(2).unwrap();
    assert!(level2.is_visible());
    assert_eq!(level2.parent(), Some(f.node(1, 3)));

    f.menu.pointer_move(f.at(2, 4));
    let level3 = f.menu.ring(3).unwrap();
    assert!(level3.is_visible());
    assert_eq!(level3.parent(), Some(f.node(2, 4)));
    assert_eq!(
        level3.button(7).unwrap().properties().left_macro.script,
        "htop"
    );
    assert_eq!(f.menu.ring(1).unwrap().selected_slot(), Some(3));
    assert_eq!(f.menu.ring(2).unwrap().selected_slot(), Some(4));
}

#[test]
fn test_hovering_another_top_level_item_rebinds_or_hides() {
    let mut f = nested();
    f.menu.open();
    f.menu.pointer_move(f.at(1, 3));
    f.menu.pointer_move(f.at(2, 4));

    // a different folder on level 1 rebinds level 2 and drops level 3
    let action = f.menu.pointer_move(f.at(1, 5));
    assert!(action.events.contains(&MenuEvent::RingOpened {
        level: 2,
        parent: f.node(1, 5),
    }));
    assert!(!f.menu.ring(3).unwrap().is_visible());
    assert_eq!(f.menu.ring(2).unwrap().selected_slot(), None);
    assert_eq!(
        f.menu.ring(2).unwrap().button(2).unwrap().properties().left_macro.script,
        "blender"
    );

    // a leaf on level 1 hides everything above it
    f.menu.pointer_move(f.at(1, 1));
    assert!(!f.menu.ring(2).unwrap().is_visible());
    assert_eq!(f.menu.ring(1).unwrap().selected_slot(), None);
}

#[test]
fn test_at_most_one_button_per_ring_is_selected() {
    let mut f = nested();
    f.menu.open();
    for slot in [3, 5, 3, 1, 5] {
        f.menu.pointer_move(f.at(1, slot));
        for ring in f.menu.rings() {
            let selected = ring
                .buttons()
                .iter()
                .filter(|b| b.runtime_state().selected)
                .count();
            assert!(selected <= 1, "level {} has {selected}", ring.level());
        }
    }
}

#[test]
fn test_selection_changes_are_reported() {
    let mut f = nested();
    f.menu.open();
    let action = f.menu.pointer_move(f.at(1, 3));
    assert!(action.events.contains(&MenuEvent::SelectionChanged {
        level: 1,
        node: Some(f.node(1, 3)),
    }));
    let action = f.menu.pointer_move(f.at(1, 1));
    assert!(action.events.contains(&MenuEvent::SelectionChanged {
        level: 1,
        node: None,
    }));
}

#[test]
fn test_leaving_the_surface_reports_leave() {
    let mut f = nested();
    f.menu.open();
    f.menu.pointer_move(f.at(1, 1));
    let action = f.menu.pointer_leave();
    assert_eq!(
        action.events,
        vec![MenuEvent::MouseLeave {
            level: 1,
            node: f.node(1, 1),
        }]
    );
    assert_eq!(f.menu.tooltip(), None);
}

#[test]
fn test_trigger_on_deep_level_runs_command() {
    let mut f = nested();
    f.menu.open();
    f.menu.pointer_move(f.at(1, 3));
    f.menu.pointer_move(f.at(2, 4));

    let action = f.menu.key_press(KeyInput::Char('H'));
    assert!(action.handled);
    assert!(action.hide);
    assert_eq!(f.invoked(), vec!["htop"]);
}

#[test]
fn test_escape_unwinds_one_ring_at_a_time() {
    let mut f = nested();
    f.menu.open();
    f.menu.pointer_move(f.at(1, 3));
    f.menu.pointer_move(f.at(2, 4));

    f.menu.key_press(KeyInput::Escape);
    assert!(!f.menu.ring(3).unwrap().is_visible());
    assert!(f.menu.ring(2).unwrap().is_visible());
    assert_eq!(f.menu.ring(2).unwrap().selected_slot(), None);

    f.menu.key_press(KeyInput::Escape);
    assert!(!f.menu.ring(2).unwrap().is_visible());
    assert!(f.menu.is_open());

    let action = f.menu.key_press(KeyInput::Escape);
    assert!(action.events.contains(&MenuEvent::MenuClosed));
    assert!(!f.menu.is_open());
}

#[test]
fn test_right_click_runs_right_macro() {
    let mut props = leaf("firefox");
    props.right_macro = rondel_core::Macro::new("firefox --private-window", "Private");
    let mut f = Fixture::new(&[("1", props)]);
    f.menu.open();
    f.menu
        .press(f.at(1, 1), MouseButton::Secondary, Modifiers::default());
    assert_eq!(f.invoked(), vec!["firefox --private-window"]);
}

#[test]
fn test_closed_menu_ignores_input() {
    let mut f = nested();
    let action = f.menu.pointer_move(f.at(1, 3));
    assert!(action.events.is_empty());
    let action = f
        .menu
        .press(f.at(1, 1), MouseButton::Primary, Modifiers::default());
    assert!(!action.handled);
    assert!(f.invoked().is_empty());
    assert!(!f.menu.key_press(KeyInput::Escape).handled);
}
