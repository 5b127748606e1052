use crate::animation::OverlayFader;
use crate::fsm::{ButtonInput, ButtonState, ButtonStateMachine};
use crate::geometry::{Point, SectorGeometry};
use crate::model::{ButtonId, CommandProperties, IconData, NodeId};
use std::time::{Duration, Instant};
use strum::Display;

pub const FOLDER_GLYPH_SIZE: f64 = 12.0;
const FOLDER_GLYPH_MARGIN: f64 = 2.0;
const TRIGGER_RADIUS_OFFSET: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum MouseButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
    pub logo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ButtonSignal {
    Enter,
    Move,
    Leave,
    Click(MouseButton),
    ContextMenu,
    DragStart,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonRuntimeState {
    pub hovering: bool,
    pub selected: bool,
    pub edit_mode: bool,
    pub visible: bool,
}

/// Where each overlay of a button goes, in world coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonFace {
    pub icon: Option<IconData>,
    pub icon_center: Point,
    pub folder_glyph: Option<Point>,
    pub trigger: Option<(char, Point)>,
    pub edit_badge: Point,
    pub tooltip: Option<String>,
}

impl ButtonFace {
    fn compose(geometry: &SectorGeometry, props: &CommandProperties) -> Self {
        let bisector = geometry.sweep_angle() / 2.0;
        let center = geometry.to_world(geometry.sector_center_point());
        let folder_glyph = props.is_folder.then(|| {
            let radius = geometry.thickness() - FOLDER_GLYPH_SIZE / 2.0 - FOLDER_GLYPH_MARGIN;
            geometry.to_world(geometry.point_at(bisector, radius))
        });
        let trigger = props
            .trigger
            .filter(|_| props.is_active)
            .map(|c| (c, geometry.to_world(geometry.point_at(bisector, TRIGGER_RADIUS_OFFSET))));

        Self {
            icon: props.icon.clone(),
            icon_center: center,
            folder_glyph,
            trigger,
            edit_badge: center,
            tooltip: props.tooltip().map(str::to_owned),
        }
    }
}

/// One sector of a ring bound to a model node.
///
/// Pointer input comes in as world coordinates and leaves as an optional
/// [`ButtonSignal`]; the ring tags signals with their level and slot.
pub struct MenuButton {
    slot: usize,
    id: ButtonId,
    geometry: SectorGeometry,
    fsm: ButtonStateMachine,
    runtime: ButtonRuntimeState,
    drag_hover: bool,
    node: Option<NodeId>,
    properties: CommandProperties,
    face: ButtonFace,
    overlays: OverlayFader,
}

impl MenuButton {
    pub fn new(slot: usize, geometry: SectorGeometry, fade: Duration) -> Self {
        let face = ButtonFace::compose(&geometry, &CommandProperties::default());
        Self {
            slot,
            id: ButtonId::for_slot(slot),
            geometry,
            fsm: ButtonStateMachine::new(),
            runtime: ButtonRuntimeState::default(),
            drag_hover: false,
            node: None,
            properties: CommandProperties::default(),
            face,
            overlays: OverlayFader::new(fade),
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn id(&self) -> &ButtonId {
        &self.id
    }

    pub fn geometry(&self) -> &SectorGeometry {
        &self.geometry
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    pub fn face(&self) -> &ButtonFace {
        &self.face
    }

    pub fn overlays(&self) -> &OverlayFader {
        &self.overlays
    }

    pub fn state(&self) -> ButtonState {
        self.fsm.current()
    }

    pub fn runtime_state(&self) -> ButtonRuntimeState {
        self.runtime
    }

    pub fn is_enabled(&self) -> bool {
        !self.fsm.is_disabled()
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        self.overlays.is_settled(now)
    }

    pub fn bind(&mut self, node: NodeId, properties: CommandProperties) {
        self.node = Some(node);
        self.face = ButtonFace::compose(&self.geometry, &properties);
        self.properties = properties;
    }

    pub fn set_geometry(&mut self, geometry: SectorGeometry) {
        self.face = ButtonFace::compose(&geometry, &self.properties);
        self.geometry = geometry;
    }

    pub fn set_fade(&mut self, fade: Duration) {
        self.overlays.set_duration(fade);
    }

    fn fire(&mut self, input: ButtonInput) -> bool {
        self.fsm
            .fire(input, self.runtime.selected, &mut self.overlays)
            .is_some()
    }

    pub fn contains(&self, world: Point) -> bool {
        self.geometry.contains_world(world)
    }

    pub fn pointer_move(&mut self, world: Point) -> Option<ButtonSignal> {
        if !self.runtime.visible || !self.is_enabled() {
            return None;
        }
        match (self.contains(world), self.runtime.hovering) {
            (true, false) => {
                self.runtime.hovering = true;
                self.fire(ButtonInput::Enter);
                Some(ButtonSignal::Enter)
            }
            (true, true) => Some(ButtonSignal::Move),
            (false, true) => self.pointer_leave(),
            (false, false) => None,
        }
    }

    pub fn pointer_leave(&mut self) -> Option<ButtonSignal> {
        if !self.runtime.hovering {
            return None;
        }
        self.runtime.hovering = false;
        self.fire(ButtonInput::Exit);
        Some(ButtonSignal::Leave)
    }

    /// Press routing: in edit mode a primary press with the drag modifier
    /// starts a drag and a secondary press asks for the editor; otherwise
    /// active buttons click.
    pub fn press(&mut self, world: Point, button: MouseButton, drag_held: bool) -> Option<ButtonSignal> {
        if !self.runtime.visible || !self.is_enabled() || !self.contains(world) {
            return None;
        }
        self.fire(ButtonInput::Press);
        let active = self.properties.is_active;
        match button {
            MouseButton::Primary if self.runtime.edit_mode => {
                (drag_held && active).then_some(ButtonSignal::DragStart)
            }
            MouseButton::Primary => active.then_some(ButtonSignal::Click(MouseButton::Primary)),
            MouseButton::Secondary if self.runtime.edit_mode => Some(ButtonSignal::ContextMenu),
            MouseButton::Secondary => active.then_some(ButtonSignal::Click(MouseButton::Secondary)),
            MouseButton::Middle => None,
        }
    }

    pub fn release(&mut self) {
        if self.fsm.current() == ButtonState::Pressed {
            self.fire(ButtonInput::Release);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.fire(ButtonInput::Default);
            return;
        }
        self.runtime.hovering = false;
        // Pressed pops before it can be disabled
        for _ in 0..3 {
            if self.fsm.is_disabled() || !self.fire(ButtonInput::Disable) {
                break;
            }
        }
    }

    pub fn set_selected(&mut self, selected: bool) {
        if self.runtime.selected == selected {
            return;
        }
        self.runtime.selected = selected;
        self.fsm.rerender(selected, &mut self.overlays);
    }

    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        self.runtime.edit_mode = edit_mode;
    }

    /// Hiding drops any hover or press so the button reappears at rest.
    pub fn set_visible(&mut self, visible: bool) {
        self.runtime.visible = visible;
        if !visible {
            self.runtime.hovering = false;
            self.drag_hover = false;
            if !self.fsm.is_disabled() {
                self.fsm.reset();
                self.overlays.snap_default();
            }
        }
    }

    fn accepts_drag_events(&self) -> bool {
        self.runtime.edit_mode && self.runtime.visible && self.is_enabled()
    }

    pub fn drag_motion(&mut self, world: Point) -> Option<ButtonSignal> {
        if !self.accepts_drag_events() {
            return None;
        }
        match (self.contains(world), self.drag_hover) {
            (true, false) => {
                self.drag_hover = true;
                Some(ButtonSignal::DragEnter)
            }
            (true, true) => Some(ButtonSignal::DragOver),
            (false, true) => self.drag_cancel(),
            (false, false) => None,
        }
    }

    pub fn drag_cancel(&mut self) -> Option<ButtonSignal> {
        if !self.drag_hover {
            return None;
        }
        self.drag_hover = false;
        self.show_drag_accept(false);
        Some(ButtonSignal::DragLeave)
    }

    /// Lights the button up while an acceptable payload hovers over it.
    pub fn show_drag_accept(&mut self, accepted: bool) {
        if accepted && !self.runtime.hovering {
            self.runtime.hovering = true;
            self.fire(ButtonInput::Enter);
        } else if !accepted && self.runtime.hovering {
            self.runtime.hovering = false;
            self.fire(ButtonInput::Exit);
        }
    }

    pub fn drop_at(&mut self, world: Point) -> Option<ButtonSignal> {
        if !self.accepts_drag_events() || !self.contains(world) {
            return None;
        }
        self.drag_hover = false;
        self.show_drag_accept(false);
        Some(ButtonSignal::Drop)
    }

    /// Called on the drag source once the drag finished. A drag nobody
    /// accepted removes the command.
    pub fn drag_end(&mut self, accepted: bool) -> Option<ButtonSignal> {
        (self.runtime.edit_mode && !accepted).then_some(ButtonSignal::Remove)
    }
}
