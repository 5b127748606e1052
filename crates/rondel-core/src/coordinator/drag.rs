use super::{ButtonRef, MenuAction, MenuCoordinator, MenuEvent};
use crate::button::ButtonSignal;
use crate::geometry::Point;
use crate::model::{ModelRegistry, NodeId};
use crate::ports::{ExtractedCommand, ForeignPayload};
use crate::ring::RingSignal;
use log::{debug, error};

const COMMAND_PREFIX: &str = "rondel-node:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// A command dragged out of this menu.
    Command(NodeId),
    Foreign(ForeignPayload),
}

impl DragPayload {
    /// Text form used to carry a command through the toolkit's drag machinery.
    pub fn encode_command(node: NodeId) -> String {
        format!("{COMMAND_PREFIX}{}", node.index())
    }

    pub fn decode(text: &str, registry: &ModelRegistry) -> Self {
        text.strip_prefix(COMMAND_PREFIX)
            .and_then(|index| index.trim().parse().ok())
            .and_then(|index| registry.node_at(index))
            .map(DragPayload::Command)
            .unwrap_or_else(|| DragPayload::Foreign(ForeignPayload::text(text)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub source: NodeId,
    pub origin: ButtonRef,
    pub accepted: bool,
}

enum DropSource {
    Command(NodeId),
    Foreign(ExtractedCommand),
}

impl MenuCoordinator {
    pub fn drag_session(&self) -> Option<DragSession> {
        self.drag
    }

    pub(super) fn begin_drag(&mut self, origin: ButtonRef, node: NodeId) {
        debug!("Dragging {} from level {}", self.ctx.registry().path(node), origin.level);
        self.drag = Some(DragSession {
            source: node,
            origin,
            accepted: false,
        });
        self.register_drag_end(origin);
        self.emit(MenuEvent::DragStarted { node });
    }

    /// Only one button listens for the end of a drag; a new registration
    /// replaces the previous one.
    pub fn register_drag_end(&mut self, origin: ButtonRef) {
        if let Some(previous) = self.drag_end_listener.replace(origin)
            && previous != origin
        {
            debug!("Drag-end listener moved from {previous:?} to {origin:?}");
        }
    }

    fn recognize(&self, payload: &DragPayload) -> Option<DropSource> {
        match payload {
            DragPayload::Command(node) => self
                .ctx
                .registry()
                .get(*node)
                .is_some()
                .then_some(DropSource::Command(*node)),
            DragPayload::Foreign(foreign) => self.ctx.extract_payload(foreign).map(DropSource::Foreign),
        }
    }

    /// Levels the active part of `node`'s subtree spans, counting `node`.
    fn active_height(&mut self, node: NodeId) -> usize {
        let mut below = 0;
        for child in self.ctx.registry().children(node) {
            if self.ctx.properties(child).is_active {
                below = below.max(self.active_height(child));
            }
        }
        1 + below
    }

    /// Folder targets only take themselves back; anything else takes a drop
    /// unless it would land inside the dragged subtree or push it past the
    /// last ring.
    fn accepts_drop(&mut self, source: &DropSource, target: NodeId, level: usize) -> bool {
        let target_is_folder = self.ctx.properties(target).is_folder;
        match source {
            DropSource::Command(node) if target_is_folder => *node == target,
            DropSource::Command(node) if *node == target => true,
            DropSource::Command(node) => {
                if self.ctx.registry().is_descendant_of(target, *node) {
                    return false;
                }
                level + self.active_height(*node) - 1 <= self.rings.len()
            }
            DropSource::Foreign(_) => !target_is_folder,
        }
    }

    pub fn drag_motion(&mut self, world: Point, payload: &DragPayload) -> MenuAction {
        if !self.open || !self.edit_mode {
            return self.finish();
        }
        let source = self.recognize(payload);
        let mut signals: Vec<RingSignal> = self
            .rings
            .iter_mut()
            .filter(|r| r.is_visible())
            .flat_map(|r| r.drag_motion(world))
            .collect();
        signals.sort_by_key(|s| s.signal != ButtonSignal::DragLeave);

        for s in signals {
            let Some(node) = s.node else {
                continue;
            };
            let level = s.level;
            match s.signal {
                ButtonSignal::DragLeave => self.emit(MenuEvent::DragLeave { level, node }),
                ButtonSignal::DragEnter | ButtonSignal::DragOver => {
                    let accepted = match &source {
                        Some(source) => self.accepts_drop(source, node, level),
                        None => false,
                    };
                    if let Some(ring) = self.ring_mut(level) {
                        ring.show_drag_accept(s.slot, accepted);
                    }
                    if s.signal == ButtonSignal::DragEnter {
                        self.emit(MenuEvent::DragEnter {
                            level,
                            node,
                            accepted,
                        });
                        if source.is_some() {
                            self.on_hover(level, s.slot, node);
                        }
                        if let Some(session) = self.drag {
                            self.register_drag_end(session.origin);
                        }
                    } else {
                        self.action.events.push(MenuEvent::DragOver {
                            level,
                            node,
                            accepted,
                        });
                    }
                    self.action.handled = accepted;
                }
                _ => {}
            }
        }
        self.finish()
    }

    /// The drag left the menu surface without dropping.
    pub fn drag_leave(&mut self) -> MenuAction {
        self.cancel_drag_hover();
        self.finish()
    }

    fn cancel_drag_hover(&mut self) {
        let signals: Vec<RingSignal> = self
            .rings
            .iter_mut()
            .flat_map(|r| r.drag_cancel())
            .collect();
        for s in signals {
            if let Some(node) = s.node {
                self.emit(MenuEvent::DragLeave {
                    level: s.level,
                    node,
                });
            }
        }
    }

    /// Drops `payload` at `world`. A command dropped on a sibling replaces
    /// it and leaves its old slot empty; a cross-parent drop also fixes up
    /// folder state on both sides. Foreign payloads become a new command on
    /// the target.
    pub fn drop_payload(&mut self, world: Point, payload: &DragPayload) -> MenuAction {
        if !self.open || !self.edit_mode {
            return self.finish();
        }
        let source = self.recognize(payload);
        let hit = self
            .rings
            .iter_mut()
            .filter(|r| r.is_visible())
            .find_map(|r| r.drop_at(world));

        let target = hit.and_then(|s| Some((s.level, s.node?)));
        let accepted = match (&source, target) {
            (Some(source), Some((level, node))) => self.accepts_drop(source, node, level),
            _ => false,
        };

        if let (true, Some(source), Some((level, node))) = (accepted, source, target) {
            self.emit(MenuEvent::Drop { level, node });
            self.apply_drop(source, node);
            if let Some(session) = self.drag.as_mut() {
                session.accepted = true;
            }
            self.action.handled = true;
        }

        if matches!(payload, DragPayload::Foreign(_)) {
            self.reset_after_drag();
        }
        self.finish()
    }

    fn apply_drop(&mut self, source: DropSource, target: NodeId) {
        match source {
            DropSource::Command(node) if node == target => {}
            DropSource::Command(node) => {
                let registry = self.ctx.registry();
                let result = if registry.parent(node) == registry.parent(target) {
                    debug!("Moving {} onto sibling {}", registry.path(node), registry.path(target));
                    self.ctx.move_to_sibling(node, target)
                } else {
                    debug!("Moving {} onto {}", registry.path(node), registry.path(target));
                    self.ctx.move_subtree(node, target)
                };
                if let Err(e) = result {
                    error!("Failed to apply drop: {e}");
                }
            }
            DropSource::Foreign(command) => self.ctx.apply_extracted(target, command),
        }
    }

    /// Called once the toolkit reports the end of a drag that started in
    /// this menu. Without an accepting target the dragged command is
    /// removed.
    pub fn end_drag(&mut self, accepted_elsewhere: bool) -> MenuAction {
        let session = self.drag.take();
        let listener = self.drag_end_listener.take();
        if let (Some(session), Some(origin)) = (session, listener) {
            let accepted = session.accepted || accepted_elsewhere;
            let signal = self
                .ring_mut(origin.level)
                .and_then(|r| r.button_mut(origin.slot))
                .and_then(|b| b.drag_end(accepted));
            if signal == Some(ButtonSignal::Remove) {
                self.emit(MenuEvent::Remove {
                    node: session.source,
                });
                self.ctx.remove(session.source);
            }
        }
        self.reset_after_drag();
        self.finish()
    }

    fn reset_after_drag(&mut self) {
        self.cancel_drag_hover();
        self.close_above(1);
        self.select(1, None);
        self.action.redraw = true;
    }
}
