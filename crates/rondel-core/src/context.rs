use crate::error::MenuError;
use crate::model::{
    ButtonId, CommandEdit, CommandId, CommandProperties, IconData, Macro, ModelRegistry, NodeId,
    PropertyChange,
};
use crate::ports::{CommandStore, ExtractedCommand, ForeignPayload, HostExecutor, PayloadAdapter};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;

/// Properties of a node and everything below it, detached from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub properties: CommandProperties,
    pub children: Vec<(ButtonId, Snapshot)>,
}

/// Owns the node registry and the host collaborators.
///
/// Every property mutation goes through [`MenuContext::dispatch`], which
/// persists the node and marks it dirty so bound views can refresh.
pub struct MenuContext {
    registry: ModelRegistry,
    store: Box<dyn CommandStore>,
    host: Box<dyn HostExecutor>,
    payloads: Box<dyn PayloadAdapter>,
    dirty: BTreeSet<NodeId>,
}

impl MenuContext {
    pub fn new(
        store: Box<dyn CommandStore>,
        host: Box<dyn HostExecutor>,
        payloads: Box<dyn PayloadAdapter>,
    ) -> Self {
        let mut ctx = Self {
            registry: ModelRegistry::new(),
            store,
            host,
            payloads,
            dirty: BTreeSet::new(),
        };
        ctx.hydrate();
        ctx
    }

    /// Creates a node for every stored path so ancestry questions can be
    /// answered before a ring has visited the branch. Properties still load
    /// lazily.
    fn hydrate(&mut self) {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list stored commands: {e}");
                return;
            }
        };
        for path in &keys {
            let mut parent = None;
            for segment in path.segments() {
                match self.registry.find_or_create(segment, parent, true) {
                    Ok(Some(node)) => parent = Some(node),
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Skipping stored command '{path}': {e}");
                        break;
                    }
                }
            }
        }
        debug!(
            "Hydrated {} nodes from {} stored commands",
            self.registry.len(),
            keys.len()
        );
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn find_or_create(
        &mut self,
        id: &str,
        parent: Option<NodeId>,
        create: bool,
    ) -> Result<Option<NodeId>, MenuError> {
        let node = self.registry.find_or_create(id, parent, create)?;
        if let Some(node) = node {
            self.ensure_loaded(node);
        }
        Ok(node)
    }

    fn ensure_loaded(&mut self, node: NodeId) {
        if self.registry.get(node).is_none_or(|n| n.is_loaded()) {
            return;
        }
        let path = self.registry.path(node);
        let properties = match self.store.load(&path) {
            Ok(props) => props,
            Err(e) => {
                warn!("Failed to load command '{path}', using defaults: {e}");
                None
            }
        };
        self.registry.mark_loaded(node, properties);
    }

    pub fn properties(&mut self, node: NodeId) -> CommandProperties {
        self.ensure_loaded(node);
        self.registry.properties(node)
    }

    pub fn dispatch(&mut self, change: PropertyChange) {
        let node = change.node;
        self.ensure_loaded(node);
        if !self.registry.apply(&change) {
            return;
        }
        let path = self.registry.path(node);
        let properties = self.registry.properties(node);
        if let Err(e) = self.store.save(&path, &properties) {
            warn!("Failed to persist command '{path}': {e}");
        }
        self.dirty.insert(node);
    }

    /// Nodes changed since the last call.
    pub fn take_dirty(&mut self) -> BTreeSet<NodeId> {
        std::mem::take(&mut self.dirty)
    }

    pub fn has_active_descendant(&mut self, node: NodeId) -> bool {
        self.registry
            .descendants(node)
            .into_iter()
            .any(|d| self.properties(d).is_active)
    }

    /// Brings every ancestor's folder flag back in line with whether it still
    /// has an active descendant. Ancestors left empty are cleared.
    pub fn reconcile_ancestors(&mut self, node: NodeId) {
        for ancestor in self.registry.ancestors(node) {
            let active_below = self.has_active_descendant(ancestor);
            let props = self.properties(ancestor);
            if !active_below && (props.is_folder || props.is_active) {
                debug!("Collapsing empty folder {}", self.registry.path(ancestor));
                self.dispatch(PropertyChange::clear(ancestor));
            } else if active_below && !props.is_folder {
                self.dispatch(PropertyChange::promote(ancestor, None));
            }
        }
    }

    pub fn promote_ancestors(&mut self, node: NodeId, icon: Option<IconData>) {
        for ancestor in self.registry.ancestors(node) {
            self.dispatch(PropertyChange::promote(ancestor, icon.clone()));
        }
    }

    pub fn clear_subtree(&mut self, node: NodeId) {
        for descendant in self.registry.descendants(node).into_iter().rev() {
            self.dispatch(PropertyChange::clear(descendant));
        }
        self.dispatch(PropertyChange::clear(node));
    }

    /// Clears `node` with its whole subtree, then collapses ancestors that
    /// no longer lead anywhere.
    pub fn remove(&mut self, node: NodeId) {
        info!("Removing command {}", self.registry.path(node));
        self.clear_subtree(node);
        self.reconcile_ancestors(node);
    }

    pub fn snapshot(&mut self, node: NodeId) -> Snapshot {
        let properties = self.properties(node);
        let children = self
            .registry
            .children(node)
            .into_iter()
            .filter_map(|child| {
                let id = self.registry.get(child)?.id().clone();
                Some((id, self.snapshot(child)))
            })
            .collect();
        Snapshot {
            properties,
            children,
        }
    }

    /// Replaces the subtree at `node` with `snapshot`.
    pub fn restore(&mut self, node: NodeId, snapshot: &Snapshot) -> Result<(), MenuError> {
        self.clear_subtree(node);
        self.write_snapshot(node, snapshot)
    }

    fn write_snapshot(&mut self, node: NodeId, snapshot: &Snapshot) -> Result<(), MenuError> {
        self.dispatch(PropertyChange::replace(node, snapshot.properties.clone()));
        for (id, child) in &snapshot.children {
            if let Some(target) = self.find_or_create(id, Some(node), true)? {
                self.write_snapshot(target, child)?;
            }
        }
        Ok(())
    }

    /// Moves the subtree at `source` onto its sibling `target`, leaving
    /// `source` empty. The shared parent keeps its folder state.
    pub fn move_to_sibling(&mut self, source: NodeId, target: NodeId) -> Result<(), MenuError> {
        let moved = self.snapshot(source);
        self.clear_subtree(source);
        self.restore(target, &moved)
    }

    /// Moves the subtree at `source` onto `target`, overwriting it. Target
    /// ancestors become folders; source ancestors collapse when emptied.
    pub fn move_subtree(&mut self, source: NodeId, target: NodeId) -> Result<(), MenuError> {
        let moved = self.snapshot(source);
        self.clear_subtree(source);
        self.restore(target, &moved)?;
        self.promote_ancestors(target, moved.properties.icon.clone());
        self.reconcile_ancestors(source);
        Ok(())
    }

    pub fn extract_payload(&self, payload: &ForeignPayload) -> Option<ExtractedCommand> {
        self.payloads.try_extract_command(payload)
    }

    /// Turns `target` into a leaf running the extracted command.
    pub fn apply_extracted(&mut self, target: NodeId, command: ExtractedCommand) {
        let properties = CommandProperties {
            left_macro: Macro::new(command.script, command.tooltip),
            icon: command.icon.clone(),
            is_active: true,
            command_id: Some(
                command
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .map(CommandId::new)
                    .unwrap_or_else(CommandId::generate),
            ),
            ..Default::default()
        };
        self.clear_subtree(target);
        self.dispatch(PropertyChange::replace(target, properties));
        self.promote_ancestors(target, command.icon);
    }

    pub fn apply_edit(&mut self, node: NodeId, edit: CommandEdit) {
        let mut props = self.properties(node);
        props.left_macro = edit.left_macro;
        props.right_macro = edit.right_macro;
        props.set_trigger(edit.trigger);
        if let Some(icon) = edit.icon {
            props.icon = Some(icon);
        }
        let has_script = !props.left_macro.is_empty() || !props.right_macro.is_empty();
        props.is_active = props.is_folder || has_script;
        if props.is_active && props.command_id.is_none() {
            props.command_id = Some(CommandId::generate());
        }
        let active = props.is_active;
        let icon = props.icon.clone();
        self.dispatch(PropertyChange::replace(node, props));
        if active {
            self.promote_ancestors(node, icon);
        } else {
            self.reconcile_ancestors(node);
        }
    }

    pub fn invoke(&self, command: &Macro) -> bool {
        if command.is_empty() {
            return false;
        }
        info!("Invoking '{}'", command.label());
        match self.host.invoke(command) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to invoke '{}': {e}", command.script);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, folder, json_payload, leaf};

    fn node(ctx: &mut MenuContext, path: &[&str]) -> NodeId {
        let mut parent = None;
        for id in path {
            parent = ctx.find_or_create(id, parent, true).unwrap();
        }
        parent.unwrap()
    }

    #[test]
    fn test_hydrates_stored_paths_lazily() {
        let h = Harness::new();
        h.store.seed("2", folder());
        h.store.seed("2/4", leaf("kitty"));
        let mut ctx = h.context();

        let parent = ctx.registry().find("2", None).unwrap();
        let child = ctx.registry().find("4", Some(parent)).unwrap();
        assert!(!ctx.registry().get(child).unwrap().is_loaded());
        assert!(ctx.has_active_descendant(parent));
        assert_eq!(ctx.properties(child).left_macro.script, "kitty");
    }

    #[test]
    fn test_dispatch_persists_changes_only() {
        let h = Harness::new();
        let mut ctx = h.context();
        let n = node(&mut ctx, &["1"]);

        ctx.dispatch(PropertyChange::replace(n, leaf("foot")));
        ctx.dispatch(PropertyChange::replace(n, leaf("foot")));
        assert_eq!(h.store.0.borrow().saves.len(), 1);
        assert_eq!(h.store.get("1").unwrap().left_macro.script, "foot");
        assert_eq!(ctx.take_dirty().into_iter().collect::<Vec<_>>(), vec![n]);
        assert!(ctx.take_dirty().is_empty());
    }

    #[test]
    fn test_save_failure_does_not_block_mutation() {
        let h = Harness::new();
        h.store.0.borrow_mut().fail_saves = true;
        let mut ctx = h.context();
        let n = node(&mut ctx, &["1"]);
        ctx.dispatch(PropertyChange::replace(n, leaf("foot")));
        assert_eq!(ctx.properties(n).left_macro.script, "foot");
    }

    #[test]
    fn test_remove_collapses_empty_ancestors() {
        let h = Harness::new();
        let mut ctx = h.context();
        let top = node(&mut ctx, &["0"]);
        let mid = node(&mut ctx, &["0", "3"]);
        let a = node(&mut ctx, &["0", "3", "1"]);
        ctx.dispatch(PropertyChange::replace(a, leaf("a")));
        ctx.promote_ancestors(a, None);
        assert!(ctx.properties(top).is_folder);

        ctx.remove(a);
        assert!(ctx.properties(a).is_cleared());
        assert!(!ctx.properties(mid).is_folder);
        assert!(!ctx.properties(top).is_folder);
        assert!(h.store.get("0").is_none());
    }

    #[test]
    fn test_remove_keeps_ancestor_with_other_active_child() {
        let h = Harness::new();
        let mut ctx = h.context();
        let top = node(&mut ctx, &["0"]);
        let a = node(&mut ctx, &["0", "1"]);
        let b = node(&mut ctx, &["0", "2"]);
        for (n, s) in [(a, "a"), (b, "b")] {
            ctx.dispatch(PropertyChange::replace(n, leaf(s)));
            ctx.promote_ancestors(n, None);
        }
        ctx.remove(a);
        assert!(ctx.properties(top).is_folder);
        assert!(ctx.properties(b).is_active);
    }

    #[test]
    fn test_remove_folder_clears_descendants() {
        let h = Harness::new();
        let mut ctx = h.context();
        let f = node(&mut ctx, &["5"]);
        let c = node(&mut ctx, &["5", "0"]);
        let g = node(&mut ctx, &["5", "0", "7"]);
        ctx.dispatch(PropertyChange::replace(g, leaf("deep")));
        ctx.promote_ancestors(g, None);

        ctx.remove(f);
        for n in [f, c, g] {
            assert!(ctx.properties(n).is_cleared());
        }
    }

    #[test]
    fn test_move_subtree_carries_children() {
        let h = Harness::new();
        let mut ctx = h.context();
        let src = node(&mut ctx, &["1"]);
        let child = node(&mut ctx, &["1", "4"]);
        ctx.dispatch(PropertyChange::replace(child, leaf("deep")));
        ctx.promote_ancestors(child, None);
        let dst_parent = node(&mut ctx, &["6"]);
        let dst = node(&mut ctx, &["6", "2"]);

        ctx.move_subtree(src, dst).unwrap();

        assert!(ctx.properties(src).is_cleared());
        assert!(ctx.properties(child).is_cleared());
        assert!(ctx.properties(dst).is_folder);
        let moved = ctx.registry().find("4", Some(dst)).unwrap();
        assert_eq!(ctx.properties(moved).left_macro.script, "deep");
        assert!(ctx.properties(dst_parent).is_folder);
    }

    #[test]
    fn test_move_to_sibling_overwrites_and_clears() {
        let h = Harness::new();
        let mut ctx = h.context();
        let parent = node(&mut ctx, &["0"]);
        let a = node(&mut ctx, &["0", "1"]);
        let b = node(&mut ctx, &["0", "2"]);
        ctx.dispatch(PropertyChange::replace(parent, folder()));
        ctx.dispatch(PropertyChange::replace(a, leaf("a")));
        ctx.dispatch(PropertyChange::replace(b, leaf("b")));
        let id = ctx.properties(a).command_id;

        ctx.move_to_sibling(a, b).unwrap();

        assert!(ctx.properties(a).is_cleared());
        assert_eq!(ctx.properties(b).left_macro.script, "a");
        assert_eq!(ctx.properties(b).command_id, id);
        assert!(ctx.properties(parent).is_folder);
    }

    #[test]
    fn test_apply_extracted_makes_active_leaf() {
        let h = Harness::new();
        let mut ctx = h.context();
        let parent = node(&mut ctx, &["3"]);
        let target = node(&mut ctx, &["3", "3"]);
        let cmd = ctx.extract_payload(&json_payload("gimp")).unwrap();
        ctx.apply_extracted(target, cmd);

        let props = ctx.properties(target);
        assert!(props.is_active && !props.is_folder);
        assert!(props.command_id.is_some());
        assert!(ctx.properties(parent).is_folder);
    }

    #[test]
    fn test_apply_edit_assigns_command_id() {
        let h = Harness::new();
        let mut ctx = h.context();
        let n = node(&mut ctx, &["7"]);
        ctx.apply_edit(
            n,
            CommandEdit {
                left_macro: Macro::new("thunar", "Files"),
                trigger: Some('f'),
                ..Default::default()
            },
        );
        let props = ctx.properties(n);
        assert!(props.is_active);
        assert_eq!(props.trigger, Some('F'));
        let id = props.command_id.clone().unwrap();

        ctx.apply_edit(
            n,
            CommandEdit {
                left_macro: Macro::new("nautilus", "Files"),
                ..Default::default()
            },
        );
        assert_eq!(ctx.properties(n).command_id, Some(id));
    }

    #[test]
    fn test_invoke_skips_empty_macro() {
        let h = Harness::new();
        let ctx = h.context();
        assert!(!ctx.invoke(&Macro::default()));
        assert!(ctx.invoke(&Macro::new("true", "")));
        assert_eq!(h.host.scripts(), vec!["true"]);
    }
}
