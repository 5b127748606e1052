//! Interaction and geometry engine of the rondel radial menu.
//!
//! Leaves first: [`geometry`] builds sector shapes and hit masks, [`fsm`] drives
//! per-button visuals, [`button`] and [`ring`] bind sectors to command nodes, and
//! [`coordinator`] decides which nested ring is visible and how drops reparent
//! commands. Everything outside the engine is reached through [`ports`].

pub mod macros;

pub mod animation;
pub mod button;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod fsm;
pub mod geometry;
pub mod model;
pub mod ports;
pub mod ring;

#[cfg(test)]
pub(crate) mod testing;

pub use button::{ButtonFace, ButtonRuntimeState, ButtonSignal, Modifiers, MenuButton, MouseButton};
pub use context::MenuContext;
pub use coordinator::{
    ButtonRef, CommandEdit, DragModifier, DragPayload, DragSession, EditSession, KeyInput,
    MenuAction, MenuCoordinator, MenuEvent, MenuLayout,
};
pub use error::{MenuError, PersistError};
pub use fsm::{ButtonInput, ButtonRenderer, ButtonState, ButtonStateMachine};
pub use geometry::{Point, Rect, RingConfig, SectorGeometry, SectorTheme, StateColors};
pub use model::{
    ButtonId, CommandId, CommandProperties, IconData, Macro, ModelNode, ModelRegistry, NodeId,
    NodePath,
};
pub use ports::{CommandStore, ExtractedCommand, ForeignPayload, HostExecutor, PayloadAdapter};
pub use ring::{RadialMenuRing, RingSignal};
