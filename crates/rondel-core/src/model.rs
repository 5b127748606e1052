use crate::error::MenuError;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    Deref,
    From,
    Into,
    AsRef,
)]
#[serde(transparent)]
pub struct ButtonId(String);

crate::impl_string_newtype!(ButtonId);

impl ButtonId {
    pub fn for_slot(slot: usize) -> Self {
        Self(slot.to_string())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct CommandId(String);

crate::impl_string_newtype!(CommandId);

impl CommandId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Script to run plus the text shown while hovering it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Macro {
    pub script: String,
    pub tooltip: String,
}

impl Macro {
    pub fn new(script: impl Into<String>, tooltip: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            tooltip: tooltip.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.script.trim().is_empty()
    }

    pub fn label(&self) -> &str {
        if self.tooltip.trim().is_empty() {
            self.script.trim()
        } else {
            self.tooltip.trim()
        }
    }
}

/// Encoded image bytes (PNG, SVG, ...), shared between the model and views.
#[derive(Clone, PartialEq, Eq, Hash, Deref)]
pub struct IconData(Arc<[u8]>);

impl IconData {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for IconData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl fmt::Debug for IconData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IconData({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandProperties {
    pub left_macro: Macro,
    pub right_macro: Macro,
    pub icon: Option<IconData>,
    pub is_folder: bool,
    pub is_active: bool,
    pub trigger: Option<char>,
    pub command_id: Option<CommandId>,
}

impl CommandProperties {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }

    pub fn set_trigger(&mut self, trigger: Option<char>) {
        self.trigger = trigger
            .filter(|c| !c.is_whitespace())
            .and_then(|c| c.to_uppercase().next());
    }

    pub fn tooltip(&self) -> Option<&str> {
        if !self.is_active {
            return None;
        }
        Some(self.left_macro.label())
            .filter(|s| !s.is_empty())
            .or_else(|| Some(self.right_macro.label()).filter(|s| !s.is_empty()))
    }
}

/// Field-wise edit applied from the property editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEdit {
    pub left_macro: Macro,
    pub right_macro: Macro,
    pub trigger: Option<char>,
    /// `Some` replaces the icon, `None` keeps the current one.
    pub icon: Option<IconData>,
}

/// Handle into a [`ModelRegistry`]. Only the registry that minted it can
/// resolve it; nodes are never removed so handles never dangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parent-chain key of a node, root first. Displays as `3/1/5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<ButtonId>);

impl NodePath {
    pub fn new(segments: Vec<ButtonId>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[ButtonId] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn join(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join("/"))
    }
}

impl FromStr for NodePath {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('/')
            .map(|seg| {
                let seg = seg.trim();
                if seg.is_empty() {
                    Err(MenuError::EmptyButtonId)
                } else {
                    Ok(ButtonId::new(seg))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(segments))
    }
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    id: ButtonId,
    parent: Option<NodeId>,
    properties: CommandProperties,
    loaded: bool,
}

impl ModelNode {
    pub fn new(id: impl Into<String>, parent: Option<NodeId>) -> Result<Self, MenuError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(MenuError::EmptyButtonId);
        }
        Ok(Self {
            id: ButtonId::new(id),
            parent,
            properties: CommandProperties::default(),
            loaded: false,
        })
    }

    pub fn id(&self) -> &ButtonId {
        &self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Replace(Box<CommandProperties>),
    Clear,
    /// Marks the node as an active folder and adopts `icon` if it has none.
    Promote { icon: Option<IconData> },
}

/// One mutation of a node's properties, applied and persisted in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub node: NodeId,
    pub kind: ChangeKind,
}

impl PropertyChange {
    pub fn replace(node: NodeId, properties: CommandProperties) -> Self {
        Self {
            node,
            kind: ChangeKind::Replace(Box::new(properties)),
        }
    }

    pub fn clear(node: NodeId) -> Self {
        Self {
            node,
            kind: ChangeKind::Clear,
        }
    }

    pub fn promote(node: NodeId, icon: Option<IconData>) -> Self {
        Self {
            node,
            kind: ChangeKind::Promote { icon },
        }
    }
}

/// Arena of menu nodes keyed by `(button id, parent)`.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    nodes: Vec<ModelNode>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<&ModelNode> {
        self.nodes.get(node.0)
    }

    /// Resolves a raw index previously taken from [`NodeId::index`].
    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    pub fn find(&self, id: &str, parent: Option<NodeId>) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.parent == parent && n.id.as_str() == id)
            .map(NodeId)
    }

    /// Looks a node up by id under `parent`, creating it when asked to.
    ///
    /// Returns `Ok(None)` when the node is missing and `create` is false.
    pub fn find_or_create(
        &mut self,
        id: &str,
        parent: Option<NodeId>,
        create: bool,
    ) -> Result<Option<NodeId>, MenuError> {
        if id.trim().is_empty() {
            return Err(MenuError::EmptyButtonId);
        }
        if let Some(found) = self.find(id, parent) {
            return Ok(Some(found));
        }
        if !create {
            return Ok(None);
        }
        let node = ModelNode::new(id, parent)?;
        self.nodes.push(node);
        Ok(Some(NodeId(self.nodes.len() - 1)))
    }

    pub fn properties(&self, node: NodeId) -> CommandProperties {
        self.get(node)
            .map(|n| n.properties.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes_with_parent(Some(node))
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes_with_parent(None)
    }

    fn nodes_with_parent(&self, parent: Option<NodeId>) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent == parent)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Parent chain of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.parent(current);
        }
        chain
    }

    /// Every node below `node`, parents before children.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut queue = self.children(node);
        while let Some(next) = queue.pop() {
            out.push(next);
            queue.extend(self.children(next));
        }
        out
    }

    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    pub fn path(&self, node: NodeId) -> NodePath {
        let mut segments: Vec<ButtonId> = self
            .ancestors(node)
            .into_iter()
            .rev()
            .filter_map(|a| self.get(a).map(|n| n.id.clone()))
            .collect();
        if let Some(n) = self.get(node) {
            segments.push(n.id.clone());
        }
        NodePath(segments)
    }

    pub fn find_path(&self, path: &NodePath) -> Option<NodeId> {
        let mut parent = None;
        for segment in path.segments() {
            parent = Some(self.find(segment, parent)?);
        }
        parent
    }

    pub(crate) fn mark_loaded(&mut self, node: NodeId, properties: Option<CommandProperties>) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            if let Some(properties) = properties {
                n.properties = properties;
            }
            n.loaded = true;
        }
    }

    /// Applies a change and reports whether the properties actually differ
    /// afterwards.
    pub fn apply(&mut self, change: &PropertyChange) -> bool {
        let Some(n) = self.nodes.get_mut(change.node.0) else {
            return false;
        };
        let before = n.properties.clone();
        match &change.kind {
            ChangeKind::Replace(props) => n.properties = (**props).clone(),
            ChangeKind::Clear => n.properties.clear(),
            ChangeKind::Promote { icon } => {
                n.properties.is_folder = true;
                n.properties.is_active = true;
                if n.properties.icon.is_none() {
                    n.properties.icon = icon.clone();
                }
            }
        }
        n.loaded = true;
        n.properties != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_or_create_is_idempotent() {
        let mut reg = ModelRegistry::new();
        let root = reg.find_or_create("0", None, true).unwrap().unwrap();
        let a = reg.find_or_create("3", Some(root), true).unwrap().unwrap();
        let b = reg.find_or_create("3", Some(root), true).unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_missing_without_create() {
        let mut reg = ModelRegistry::new();
        assert_eq!(reg.find_or_create("1", None, false).unwrap(), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut reg = ModelRegistry::new();
        assert!(matches!(
            reg.find_or_create("", None, true),
            Err(MenuError::EmptyButtonId)
        ));
        assert!(matches!(
            ModelNode::new("  ", None),
            Err(MenuError::EmptyButtonId)
        ));
    }

    #[test]
    fn test_same_id_under_different_parents() {
        let mut reg = ModelRegistry::new();
        let p1 = reg.find_or_create("1", None, true).unwrap().unwrap();
        let p2 = reg.find_or_create("2", None, true).unwrap().unwrap();
        let a = reg.find_or_create("4", Some(p1), true).unwrap().unwrap();
        let b = reg.find_or_create("4", Some(p2), true).unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.children(p1), vec![a]);
        assert_eq!(reg.roots(), vec![p1, p2]);
    }

    #[test]
    fn test_paths_and_ancestry() {
        let mut reg = ModelRegistry::new();
        let a = reg.find_or_create("3", None, true).unwrap().unwrap();
        let b = reg.find_or_create("1", Some(a), true).unwrap().unwrap();
        let c = reg.find_or_create("5", Some(b), true).unwrap().unwrap();

        assert_eq!(reg.path(c).to_string(), "3/1/5");
        assert_eq!(reg.path(c).join("_"), "3_1_5");
        assert_eq!(reg.ancestors(c), vec![b, a]);
        assert!(reg.is_descendant_of(c, a));
        assert!(!reg.is_descendant_of(a, c));
        assert_eq!(reg.find_path(&"3/1/5".parse().unwrap()), Some(c));
    }

    #[test]
    fn test_path_parse_rejects_empty_segment() {
        assert!("3//5".parse::<NodePath>().is_err());
        assert_eq!("7".parse::<NodePath>().unwrap().depth(), 1);
    }

    #[test]
    fn test_promote_keeps_existing_icon() {
        let mut reg = ModelRegistry::new();
        let n = reg.find_or_create("0", None, true).unwrap().unwrap();
        let mine = IconData::from(vec![1, 2, 3]);
        let theirs = IconData::from(vec![9]);
        reg.apply(&PropertyChange::replace(
            n,
            CommandProperties {
                icon: Some(mine.clone()),
                ..Default::default()
            },
        ));
        assert!(reg.apply(&PropertyChange::promote(n, Some(theirs))));
        let props = reg.properties(n);
        assert!(props.is_folder && props.is_active);
        assert_eq!(props.icon, Some(mine));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut props = CommandProperties {
            left_macro: Macro::new("firefox", "Browser"),
            right_macro: Macro::new("firefox --private-window", ""),
            icon: Some(IconData::from(vec![1])),
            is_folder: true,
            is_active: true,
            trigger: Some('B'),
            command_id: Some(CommandId::generate()),
        };
        props.clear();
        assert!(props.is_cleared());
    }

    #[test]
    fn test_trigger_is_upper_cased() {
        let mut props = CommandProperties::default();
        props.set_trigger(Some('q'));
        assert_eq!(props.trigger, Some('Q'));
        props.set_trigger(Some(' '));
        assert_eq!(props.trigger, None);
    }

    #[test]
    fn test_tooltip_prefers_left_label() {
        let props = CommandProperties {
            left_macro: Macro::new("kitty", ""),
            right_macro: Macro::new("alacritty", "Other terminal"),
            is_active: true,
            ..Default::default()
        };
        assert_eq!(props.tooltip(), Some("kitty"));
        let inactive = CommandProperties {
            is_active: false,
            ..props
        };
        assert_eq!(inactive.tooltip(), None);
    }
}
