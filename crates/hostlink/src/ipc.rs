//! Line protocol between `rondelctl` and the running menu.

use strum::{Display, EnumString};

pub const SOCKET_PATH: &str = "/tmp/rondel.sock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IpcCommand {
    /// Open the menu at the cursor.
    Show,
    Hide,
    /// Open the menu with edit mode switched on.
    Edit,
}
