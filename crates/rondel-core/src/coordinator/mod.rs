mod drag;
mod layout;

pub use drag::{DragPayload, DragSession};
pub use layout::{DragModifier, MAX_LEVELS, MenuLayout};

pub use crate::model::CommandEdit;

use crate::button::{ButtonSignal, Modifiers, MouseButton};
use crate::context::MenuContext;
use crate::error::MenuError;
use crate::geometry::Point;
use crate::model::{Macro, NodeId};
use crate::ring::{RadialMenuRing, RingSignal};
use log::{debug, error, info};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEvent {
    MouseEnter { level: usize, node: NodeId },
    MouseMove { level: usize, node: NodeId },
    MouseLeave { level: usize, node: NodeId },
    Click { level: usize, node: NodeId, button: MouseButton },
    ContextMenuRequested { level: usize, node: NodeId, position: Point },
    SelectionChanged { level: usize, node: Option<NodeId> },
    RingOpened { level: usize, parent: NodeId },
    RingClosed { level: usize },
    DragStarted { node: NodeId },
    DragEnter { level: usize, node: NodeId, accepted: bool },
    DragOver { level: usize, node: NodeId, accepted: bool },
    DragLeave { level: usize, node: NodeId },
    Drop { level: usize, node: NodeId },
    Remove { node: NodeId },
    Invoked { node: NodeId, command: Macro },
    EditModeChanged(bool),
    MenuClosed,
}

/// What the shell should do after feeding one input to the coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuAction {
    pub events: Vec<MenuEvent>,
    pub redraw: bool,
    pub hide: bool,
    pub handled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Escape,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonRef {
    pub level: usize,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSession {
    pub origin: ButtonRef,
    pub node: NodeId,
}

/// Owns the rings and the model context and routes all pointer, key, and
/// drag input between them.
pub struct MenuCoordinator {
    layout: MenuLayout,
    rings: Vec<RadialMenuRing>,
    ctx: MenuContext,
    open: bool,
    edit_mode: bool,
    editing: Option<EditSession>,
    drag: Option<DragSession>,
    drag_end_listener: Option<ButtonRef>,
    tooltip: Option<String>,
    action: MenuAction,
}

fn build_rings(layout: &MenuLayout) -> Result<Vec<RadialMenuRing>, MenuError> {
    let center = layout.center();
    layout
        .ring_configs()
        .into_iter()
        .map(|config| {
            RadialMenuRing::new(
                config,
                center,
                &layout.theme,
                layout.button_fade,
                layout.ring_fade,
            )
        })
        .collect()
}

impl MenuCoordinator {
    pub fn new(layout: MenuLayout, ctx: MenuContext) -> Result<Self, MenuError> {
        let rings = build_rings(&layout)?;
        let mut coordinator = Self {
            layout,
            rings,
            ctx,
            open: false,
            edit_mode: false,
            editing: None,
            drag: None,
            drag_end_listener: None,
            tooltip: None,
            action: MenuAction::default(),
        };
        if let Some(top) = coordinator.rings.first_mut() {
            top.bind_to(&mut coordinator.ctx, None)?;
        }
        Ok(coordinator)
    }

    pub fn layout(&self) -> &MenuLayout {
        &self.layout
    }

    pub fn rings(&self) -> &[RadialMenuRing] {
        &self.rings
    }

    pub fn ring(&self, level: usize) -> Option<&RadialMenuRing> {
        self.rings.get(level.checked_sub(1)?)
    }

    fn ring_mut(&mut self, level: usize) -> Option<&mut RadialMenuRing> {
        self.rings.get_mut(level.checked_sub(1)?)
    }

    pub fn context(&self) -> &MenuContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut MenuContext {
        &mut self.ctx
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn editing(&self) -> Option<EditSession> {
        self.editing
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.rings.iter().any(|r| !r.is_settled(now))
    }

    fn topmost_visible(&self) -> Option<usize> {
        self.rings
            .iter()
            .rev()
            .find(|r| r.is_visible())
            .map(|r| r.level())
    }

    fn emit(&mut self, event: MenuEvent) {
        self.action.events.push(event);
        self.action.redraw = true;
    }

    fn sync_views(&mut self) {
        let changed = self.ctx.take_dirty();
        if changed.is_empty() {
            return;
        }
        for ring in &mut self.rings {
            ring.refresh(&mut self.ctx, &changed);
        }
        self.action.redraw = true;
    }

    fn finish(&mut self) -> MenuAction {
        self.sync_views();
        std::mem::take(&mut self.action)
    }

    pub fn open(&mut self) -> MenuAction {
        info!("Opening menu");
        self.open = true;
        self.tooltip = None;
        for ring in self.rings.iter_mut().skip(1) {
            ring.show(false);
        }
        if let Some(top) = self.rings.first_mut() {
            if let Err(e) = top.bind_to(&mut self.ctx, None) {
                error!("Failed to bind top level: {e}");
            }
            top.show(true);
        }
        self.action.redraw = true;
        self.finish()
    }

    pub fn close(&mut self) -> MenuAction {
        self.close_menu();
        self.finish()
    }

    fn close_menu(&mut self) {
        for ring in &mut self.rings {
            if ring.is_visible() {
                ring.show(false);
            }
        }
        self.editing = None;
        self.drag = None;
        self.drag_end_listener = None;
        self.tooltip = None;
        if self.open {
            debug!("Closing menu");
            self.open = false;
            self.emit(MenuEvent::MenuClosed);
        }
        self.action.hide = true;
    }

    pub fn set_edit_mode(&mut self, edit_mode: bool) -> MenuAction {
        self.apply_edit_mode(edit_mode);
        self.finish()
    }

    pub fn toggle_edit_mode(&mut self) -> MenuAction {
        self.apply_edit_mode(!self.edit_mode);
        self.finish()
    }

    fn apply_edit_mode(&mut self, edit_mode: bool) {
        if self.edit_mode == edit_mode {
            return;
        }
        info!("Edit mode {}", if edit_mode { "on" } else { "off" });
        self.edit_mode = edit_mode;
        self.editing = None;
        for ring in &mut self.rings {
            ring.switch_edit_mode(edit_mode);
        }
        self.close_above(1);
        self.select(1, None);
        if let Some(top) = self.ring_mut(1) {
            top.enable_all();
        }
        self.emit(MenuEvent::EditModeChanged(edit_mode));
    }

    pub fn hits_center(&self, world: Point) -> bool {
        world.distance(self.layout.center()) <= self.layout.center_radius()
    }

    /// Primary closes the menu, secondary toggles edit mode.
    pub fn press_center(&mut self, button: MouseButton) -> MenuAction {
        match button {
            MouseButton::Primary => self.close_menu(),
            MouseButton::Secondary => self.apply_edit_mode(!self.edit_mode),
            MouseButton::Middle => {}
        }
        self.finish()
    }

    fn select(&mut self, level: usize, slot: Option<usize>) {
        let Some(ring) = self.ring_mut(level) else {
            return;
        };
        if !ring.set_selected_slot(slot) {
            return;
        }
        let node = slot.and_then(|s| ring.button(s)).and_then(|b| b.node());
        self.emit(MenuEvent::SelectionChanged { level, node });
    }

    fn hide_ring(&mut self, level: usize) {
        let Some(ring) = self.ring_mut(level) else {
            return;
        };
        if !ring.is_visible() {
            return;
        }
        let had_selection = ring.selected_slot().is_some();
        ring.show(false);
        if had_selection {
            self.emit(MenuEvent::SelectionChanged { level, node: None });
        }
        self.emit(MenuEvent::RingClosed { level });
    }

    fn close_above(&mut self, level: usize) {
        for above in (level + 1..=self.rings.len()).rev() {
            self.hide_ring(above);
        }
    }

    /// Shows the folder's children on the next ring, unless that ring
    /// already shows them.
    fn open_submenu(&mut self, level: usize, slot: usize, folder: NodeId) {
        self.select(level, Some(slot));
        let next = level + 1;
        let Some(ring) = self.rings.get_mut(level) else {
            return;
        };
        if !(ring.is_visible() && ring.is_bound_to(Some(folder))) {
            if let Err(e) = ring.bind_to(&mut self.ctx, Some(folder)) {
                error!("Failed to open submenu on level {next}: {e}");
                return;
            }
            ring.show(true);
            self.emit(MenuEvent::RingOpened {
                level: next,
                parent: folder,
            });
        }
        self.close_above(next);
    }

    fn on_hover(&mut self, level: usize, slot: usize, node: NodeId) {
        let props = self.ctx.properties(node);
        self.tooltip = props.tooltip().map(str::to_owned);
        if props.is_folder && level < self.rings.len() {
            self.open_submenu(level, slot, node);
        } else {
            self.close_above(level);
            self.select(level, None);
        }
    }

    pub fn pointer_move(&mut self, world: Point) -> MenuAction {
        if self.open && self.editing.is_none() {
            let mut signals: Vec<RingSignal> = self
                .rings
                .iter_mut()
                .filter(|r| r.is_visible())
                .flat_map(|r| r.pointer_move(world))
                .collect();
            signals.sort_by_key(|s| s.signal != ButtonSignal::Leave);
            for signal in signals {
                self.route_pointer(signal);
            }
        }
        self.finish()
    }

    pub fn pointer_leave(&mut self) -> MenuAction {
        let signals: Vec<RingSignal> = self
            .rings
            .iter_mut()
            .flat_map(|r| r.pointer_leave())
            .collect();
        for signal in signals {
            self.route_pointer(signal);
        }
        self.finish()
    }

    fn route_pointer(&mut self, s: RingSignal) {
        let Some(node) = s.node else {
            return;
        };
        let level = s.level;
        match s.signal {
            ButtonSignal::Enter => {
                self.emit(MenuEvent::MouseEnter { level, node });
                self.on_hover(level, s.slot, node);
            }
            ButtonSignal::Move => self.action.events.push(MenuEvent::MouseMove { level, node }),
            ButtonSignal::Leave => {
                self.tooltip = None;
                self.emit(MenuEvent::MouseLeave { level, node });
            }
            _ => {}
        }
    }

    pub fn press(&mut self, world: Point, button: MouseButton, mods: Modifiers) -> MenuAction {
        if !self.open || self.editing.is_some() {
            return self.finish();
        }
        if self.hits_center(world) {
            return self.press_center(button);
        }
        let drag_held = self.layout.drag_modifier.is_held(mods);
        let hit = self
            .rings
            .iter_mut()
            .filter(|r| r.is_visible())
            .find_map(|r| r.press(world, button, drag_held));
        if let Some(signal) = hit {
            self.action.handled = true;
            self.action.redraw = true;
            self.route_press(signal, world);
        }
        self.finish()
    }

    fn route_press(&mut self, s: RingSignal, world: Point) {
        let Some(node) = s.node else {
            return;
        };
        match s.signal {
            ButtonSignal::Click(button) => {
                self.emit(MenuEvent::Click {
                    level: s.level,
                    node,
                    button,
                });
                self.activate(node, button);
            }
            ButtonSignal::ContextMenu => self.open_editor(
                ButtonRef {
                    level: s.level,
                    slot: s.slot,
                },
                node,
                world,
            ),
            ButtonSignal::DragStart => self.begin_drag(
                ButtonRef {
                    level: s.level,
                    slot: s.slot,
                },
                node,
            ),
            _ => {}
        }
    }

    pub fn release(&mut self) -> MenuAction {
        for ring in &mut self.rings {
            ring.release();
        }
        self.action.redraw = true;
        self.finish()
    }

    /// Runs the macro behind a leaf. The menu closes before the host sees
    /// the command.
    fn activate(&mut self, node: NodeId, button: MouseButton) {
        let props = self.ctx.properties(node);
        if props.is_folder {
            return;
        }
        let command = match button {
            MouseButton::Primary => props.left_macro,
            MouseButton::Secondary => props.right_macro,
            MouseButton::Middle => return,
        };
        if command.is_empty() {
            debug!("No {button} command on {}", self.ctx.registry().path(node));
            return;
        }
        self.close_menu();
        if self.ctx.invoke(&command) {
            self.emit(MenuEvent::Invoked { node, command });
        }
    }

    pub fn key_press(&mut self, key: KeyInput) -> MenuAction {
        if self.open {
            match key {
                KeyInput::Escape => {
                    self.escape();
                    self.action.handled = true;
                }
                KeyInput::Char(letter) if self.editing.is_none() => {
                    self.action.handled = self.trigger(letter);
                }
                _ => {}
            }
        }
        self.finish()
    }

    /// Closes the editor if it is open, otherwise the outermost ring above
    /// the first; on the first ring the whole menu closes.
    fn escape(&mut self) {
        if self.editing.is_some() {
            self.end_editing();
            return;
        }
        match self.topmost_visible() {
            Some(level) if level > 1 => {
                self.hide_ring(level);
                self.select(level - 1, None);
                if let Some(ring) = self.ring_mut(level - 1) {
                    ring.enable_all();
                }
            }
            _ => self.close_menu(),
        }
    }

    fn trigger(&mut self, letter: char) -> bool {
        let Some(level) = self.topmost_visible() else {
            return false;
        };
        let Some((slot, node)) = self.ring(level).and_then(|ring| {
            let slot = ring.find_trigger(letter)?;
            Some((slot, ring.button(slot)?.node()?))
        }) else {
            return false;
        };
        debug!("Trigger '{letter}' matched level {level} slot {slot}");
        if self.ctx.properties(node).is_folder {
            if level >= self.rings.len() {
                return false;
            }
            self.open_submenu(level, slot, node);
            return true;
        }
        if self.edit_mode {
            return false;
        }
        self.activate(node, MouseButton::Primary);
        true
    }

    fn open_editor(&mut self, origin: ButtonRef, node: NodeId, position: Point) {
        self.emit(MenuEvent::ContextMenuRequested {
            level: origin.level,
            node,
            position,
        });
        self.close_above(origin.level);
        self.select(origin.level, Some(origin.slot));
        if let Some(ring) = self.ring_mut(origin.level) {
            ring.disable_all_except_selected();
        }
        self.editing = Some(EditSession { origin, node });
    }

    fn end_editing(&mut self) {
        let Some(session) = self.editing.take() else {
            return;
        };
        let level = session.origin.level;
        self.select(level, None);
        if let Some(ring) = self.ring_mut(level) {
            ring.enable_all();
        }
    }

    pub fn close_editor(&mut self) -> MenuAction {
        self.end_editing();
        self.finish()
    }

    /// Writes editor changes back to the node and refreshes every view of it.
    pub fn update_command(&mut self, node: NodeId, edit: CommandEdit) -> MenuAction {
        info!("Updating command {}", self.ctx.registry().path(node));
        self.ctx.apply_edit(node, edit);
        self.action.handled = true;
        self.finish()
    }

    /// Swaps in a new layout. Node bindings and edit mode carry over; an open
    /// menu restarts at the first ring.
    pub fn rebuild(&mut self, layout: MenuLayout) -> Result<MenuAction, MenuError> {
        let mut rings = build_rings(&layout)?;
        if let Some(top) = rings.first_mut() {
            top.bind_to(&mut self.ctx, None)?;
        }
        for ring in &mut rings {
            ring.switch_edit_mode(self.edit_mode);
        }
        if self.open
            && let Some(top) = rings.first_mut()
        {
            top.show(true);
        }
        self.rings = rings;
        self.layout = layout;
        self.editing = None;
        self.drag = None;
        self.drag_end_listener = None;
        self.action.redraw = true;
        info!("Menu layout rebuilt with {} levels", self.rings.len());
        Ok(self.finish())
    }
}
