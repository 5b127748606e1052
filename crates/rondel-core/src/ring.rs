use crate::animation::Fade;
use crate::button::{ButtonSignal, MenuButton, MouseButton};
use crate::context::MenuContext;
use crate::error::MenuError;
use crate::geometry::{Point, RingConfig, SectorTheme, build_ring_sectors};
use crate::model::{ButtonId, NodeId};
use log::debug;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// A button signal tagged with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSignal {
    pub level: usize,
    pub slot: usize,
    pub node: Option<NodeId>,
    pub signal: ButtonSignal,
}

/// One concentric ring of buttons, all bound under the same parent node.
pub struct RadialMenuRing {
    config: RingConfig,
    center: Point,
    buttons: Vec<MenuButton>,
    parent: Option<NodeId>,
    bound: bool,
    selected: Option<usize>,
    visible: bool,
    fade: Fade,
}

impl RadialMenuRing {
    pub fn new(
        config: RingConfig,
        center: Point,
        theme: &SectorTheme,
        button_fade: Duration,
        ring_fade: Duration,
    ) -> Result<Self, MenuError> {
        let buttons = build_ring_sectors(center, &config, theme)?
            .into_iter()
            .enumerate()
            .map(|(slot, geometry)| MenuButton::new(slot, geometry, button_fade))
            .collect();
        Ok(Self {
            config,
            center,
            buttons,
            parent: None,
            bound: false,
            selected: None,
            visible: false,
            fade: Fade::new(0.0, ring_fade),
        })
    }

    pub fn level(&self) -> usize {
        self.config.level
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn buttons(&self) -> &[MenuButton] {
        &self.buttons
    }

    pub fn button(&self, slot: usize) -> Option<&MenuButton> {
        self.buttons.get(slot)
    }

    pub(crate) fn button_mut(&mut self, slot: usize) -> Option<&mut MenuButton> {
        self.buttons.get_mut(slot)
    }

    /// Parent node the buttons are currently bound under. `None` for the
    /// top level or an unbound ring.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_bound_to(&self, parent: Option<NodeId>) -> bool {
        self.bound && self.parent == parent
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn opacity(&self, now: Instant) -> f64 {
        self.fade.sample(now)
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        self.fade.is_settled(now) && self.buttons.iter().all(|b| b.is_settled(now))
    }

    pub fn selected_slot(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_button_id(&self) -> Option<&ButtonId> {
        self.selected
            .and_then(|slot| self.buttons.get(slot))
            .map(|b| b.id())
    }

    /// Marks exactly one button selected, or none. Returns whether the
    /// selection changed.
    pub fn set_selected_slot(&mut self, slot: Option<usize>) -> bool {
        let slot = slot.filter(|s| *s < self.buttons.len());
        if slot == self.selected {
            return false;
        }
        self.selected = slot;
        for button in &mut self.buttons {
            button.set_selected(Some(button.slot()) == slot);
        }
        true
    }

    pub fn set_selected_button_id(&mut self, id: Option<&str>) -> bool {
        let slot = id.and_then(|id| self.buttons.iter().position(|b| b.id().as_str() == id));
        self.set_selected_slot(slot)
    }

    pub fn disable_all_except_selected(&mut self) {
        let selected = self.selected;
        for button in &mut self.buttons {
            button.set_enabled(Some(button.slot()) == selected);
        }
    }

    pub fn enable_all(&mut self) {
        for button in &mut self.buttons {
            button.set_enabled(true);
        }
    }

    /// Binds slot `i` to the child of `parent` with button id `i`, creating
    /// nodes as needed.
    pub fn bind_to(&mut self, ctx: &mut MenuContext, parent: Option<NodeId>) -> Result<(), MenuError> {
        for button in &mut self.buttons {
            if let Some(node) = ctx.find_or_create(button.id(), parent, true)? {
                let props = ctx.properties(node);
                button.bind(node, props);
            }
        }
        self.parent = parent;
        self.bound = true;
        debug!(
            "Bound level {} under {}",
            self.config.level,
            parent.map_or_else(|| "root".to_owned(), |p| ctx.registry().path(p).to_string())
        );
        Ok(())
    }

    /// Re-reads properties for buttons bound to any of `changed`.
    pub fn refresh(&mut self, ctx: &mut MenuContext, changed: &BTreeSet<NodeId>) {
        for button in &mut self.buttons {
            if let Some(node) = button.node().filter(|n| changed.contains(n)) {
                let props = ctx.properties(node);
                button.bind(node, props);
            }
        }
    }

    /// Shows or hides the ring. Either way the selection is cleared and
    /// every button is enabled again.
    pub fn show(&mut self, visible: bool) {
        self.set_selected_slot(None);
        self.enable_all();
        for button in &mut self.buttons {
            button.set_visible(visible);
        }
        self.visible = visible;
        self.fade.retarget(if visible { 1.0 } else { 0.0 }, Instant::now());
    }

    pub fn switch_edit_mode(&mut self, edit_mode: bool) {
        for button in &mut self.buttons {
            button.set_edit_mode(edit_mode);
        }
    }

    fn tag(&self, slot: usize, signal: ButtonSignal) -> RingSignal {
        RingSignal {
            level: self.config.level,
            slot,
            node: self.buttons.get(slot).and_then(|b| b.node()),
            signal,
        }
    }

    fn collect(&mut self, mut each: impl FnMut(&mut MenuButton) -> Option<ButtonSignal>) -> Vec<RingSignal> {
        let fired: Vec<(usize, ButtonSignal)> = self
            .buttons
            .iter_mut()
            .filter_map(|b| {
                let slot = b.slot();
                each(b).map(|s| (slot, s))
            })
            .collect();
        fired.into_iter().map(|(slot, s)| self.tag(slot, s)).collect()
    }

    /// Pointer motion in world coordinates. Leave signals come first.
    pub fn pointer_move(&mut self, world: Point) -> Vec<RingSignal> {
        let mut signals = self.collect(|b| b.pointer_move(world));
        signals.sort_by_key(|s| s.signal != ButtonSignal::Leave);
        signals
    }

    pub fn pointer_leave(&mut self) -> Vec<RingSignal> {
        self.collect(|b| b.pointer_leave())
    }

    pub fn press(&mut self, world: Point, button: MouseButton, drag_held: bool) -> Option<RingSignal> {
        self.collect(|b| b.press(world, button, drag_held))
            .into_iter()
            .next()
    }

    pub fn release(&mut self) {
        for button in &mut self.buttons {
            button.release();
        }
    }

    /// Slot whose active command has trigger `letter`, ignoring case.
    pub fn find_trigger(&self, letter: char) -> Option<usize> {
        let wanted = letter.to_uppercase().next()?;
        self.buttons
            .iter()
            .find(|b| {
                let p = b.properties();
                p.is_active && p.trigger == Some(wanted)
            })
            .map(|b| b.slot())
    }

    pub fn slot_of(&self, node: NodeId) -> Option<usize> {
        self.buttons.iter().position(|b| b.node() == Some(node))
    }

    pub fn drag_motion(&mut self, world: Point) -> Vec<RingSignal> {
        let mut signals = self.collect(|b| b.drag_motion(world));
        signals.sort_by_key(|s| s.signal != ButtonSignal::DragLeave);
        signals
    }

    pub fn drag_cancel(&mut self) -> Vec<RingSignal> {
        self.collect(|b| b.drag_cancel())
    }

    pub fn drop_at(&mut self, world: Point) -> Option<RingSignal> {
        self.collect(|b| b.drop_at(world)).into_iter().next()
    }

    pub fn show_drag_accept(&mut self, slot: usize, accepted: bool) {
        if let Some(button) = self.buttons.get_mut(slot) {
            button.show_drag_accept(accepted);
        }
    }

    pub fn hit(&self, world: Point) -> Option<usize> {
        if !self.visible {
            return None;
        }
        self.buttons.iter().position(|b| b.contains(world))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyChange;
    use crate::testing::{Harness, folder, leaf};

    const CENTER: Point = Point::new(400.0, 400.0);

    fn ring(level: usize) -> RadialMenuRing {
        let config = RingConfig::new(level, 50.0, 60.0, 0.0);
        RadialMenuRing::new(config, CENTER, &SectorTheme::default(), Duration::ZERO, Duration::ZERO).unwrap()
    }

    fn slot_point(ring: &RadialMenuRing, slot: usize) -> Point {
        let g = ring.button(slot).unwrap().geometry();
        g.to_world(g.sector_center_point())
    }

    #[test]
    fn test_binds_one_node_per_slot() {
        let h = Harness::new();
        let mut ctx = h.context();
        let mut r = ring(1);
        r.bind_to(&mut ctx, None).unwrap();

        assert_eq!(ctx.registry().roots().len(), 8);
        for (slot, button) in r.buttons().iter().enumerate() {
            let node = button.node().unwrap();
            assert_eq!(ctx.registry().get(node).unwrap().id().as_str(), slot.to_string());
        }
        assert!(r.is_bound_to(None));
    }

    #[test]
    fn test_rebinding_reuses_nodes() {
        let h = Harness::new();
        let mut ctx = h.context();
        let mut r = ring(1);
        r.bind_to(&mut ctx, None).unwrap();
        let first: Vec<_> = r.buttons().iter().map(|b| b.node()).collect();
        r.bind_to(&mut ctx, None).unwrap();
        let second: Vec<_> = r.buttons().iter().map(|b| b.node()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_selection() {
        let mut r = ring(1);
        assert!(r.set_selected_button_id(Some("3")));
        assert!(!r.set_selected_button_id(Some("3")));
        assert!(r.set_selected_slot(Some(5)));
        let selected: Vec<_> = r
            .buttons()
            .iter()
            .filter(|b| b.runtime_state().selected)
            .map(|b| b.slot())
            .collect();
        assert_eq!(selected, vec![5]);
        assert_eq!(r.selected_button_id().map(|id| id.as_str()), Some("5"));

        assert!(r.set_selected_button_id(None));
        assert!(r.buttons().iter().all(|b| !b.runtime_state().selected));
        assert!(!r.set_selected_button_id(Some("nope")));
    }

    #[test]
    fn test_disable_all_except_selected() {
        let mut r = ring(1);
        r.set_selected_slot(Some(2));
        r.disable_all_except_selected();
        for b in r.buttons() {
            assert_eq!(b.is_enabled(), b.slot() == 2);
        }
        r.enable_all();
        assert!(r.buttons().iter().all(|b| b.is_enabled()));
    }

    #[test]
    fn test_show_resets_selection_and_enables() {
        let mut r = ring(2);
        r.show(true);
        r.set_selected_slot(Some(1));
        r.disable_all_except_selected();
        r.show(false);
        assert!(!r.is_visible());
        assert_eq!(r.selected_slot(), None);
        assert!(r.buttons().iter().all(|b| b.is_enabled() && !b.runtime_state().visible));
    }

    #[test]
    fn test_leave_precedes_enter() {
        let mut r = ring(1);
        r.show(true);
        let a = slot_point(&r, 0);
        let b = slot_point(&r, 1);
        r.pointer_move(a);
        let signals = r.pointer_move(b);
        let kinds: Vec<_> = signals.iter().map(|s| (s.slot, s.signal)).collect();
        assert_eq!(kinds, vec![(0, ButtonSignal::Leave), (1, ButtonSignal::Enter)]);
    }

    #[test]
    fn test_find_trigger_ignores_case_and_inactive() {
        let h = Harness::new();
        let mut ctx = h.context();
        let mut r = ring(1);
        r.bind_to(&mut ctx, None).unwrap();

        let mut active = leaf("firefox");
        active.set_trigger(Some('b'));
        let mut inactive = folder();
        inactive.is_active = false;
        inactive.set_trigger(Some('c'));
        let n4 = r.button(4).unwrap().node().unwrap();
        let n6 = r.button(6).unwrap().node().unwrap();
        ctx.dispatch(PropertyChange::replace(n4, active));
        ctx.dispatch(PropertyChange::replace(n6, inactive));
        let changed = ctx.take_dirty();
        r.refresh(&mut ctx, &changed);

        assert_eq!(r.find_trigger('b'), Some(4));
        assert_eq!(r.find_trigger('B'), Some(4));
        assert_eq!(r.find_trigger('c'), None);
        assert_eq!(r.find_trigger('z'), None);
    }

    #[test]
    fn test_hidden_ring_has_no_hits() {
        let mut r = ring(1);
        let p = slot_point(&r, 3);
        assert_eq!(r.hit(p), None);
        r.show(true);
        assert_eq!(r.hit(p), Some(3));
    }
}
