//! Desktop-side collaborators of the rondel menu: the command store on disk,
//! shell execution, drag payload decoding, and compositor queries.

pub mod desktop;
pub mod exec;
pub mod icon;
pub mod ipc;
pub mod payload;
pub mod store;
pub mod wm;
