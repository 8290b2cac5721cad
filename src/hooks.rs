//! Lifecycle callbacks fired by the walker around every dispatch.

use std::rc::Rc;

use crate::{
    ast::{Ast, NodeId},
    error::HookError,
    metadata::{Ancestors, Metadata},
};

pub type NodeHook = Box<dyn FnMut(&Ast, NodeId, &Ancestors) -> Result<(), HookError>>;
pub type FinishHook = Box<dyn FnMut(&Ast, NodeId, Option<&Rc<Metadata>>) -> Result<(), HookError>>;

/// One set of optional callbacks. Unset slots are skipped.
#[derive(Default)]
pub struct Hook {
    pub on_node: Option<NodeHook>,
    pub on_node_leave: Option<NodeHook>,
    pub on_finished: Option<FinishHook>,
}

impl Hook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fired before a node is dispatched, with the stack already holding its frame.
    pub fn on_enter<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Ast, NodeId, &Ancestors) -> Result<(), HookError> + 'static,
    {
        self.on_node = Some(Box::new(f));
        self
    }

    pub fn on_leave<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Ast, NodeId, &Ancestors) -> Result<(), HookError> + 'static,
    {
        self.on_node_leave = Some(Box::new(f));
        self
    }

    /// Fired once per completed traversal with the root and its metadata.
    pub fn on_finished<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Ast, NodeId, Option<&Rc<Metadata>>) -> Result<(), HookError> + 'static,
    {
        self.on_finished = Some(Box::new(f));
        self
    }
}

/// Ordered hook list owned by a visitor.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Hook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    pub fn reset(&mut self) {
        self.hooks.clear();
    }

    /// Remove the most recently added hook.
    pub fn pop(&mut self) -> Option<Hook> {
        self.hooks.pop()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    // The fire_* methods run every hook in registration order and hand back
    // the failures; a failing hook does not stop the ones after it.

    pub fn fire_enter(&mut self, ast: &Ast, node: NodeId, stack: &Ancestors) -> Vec<HookError> {
        self.hooks
            .iter_mut()
            .filter_map(|hook| hook.on_node.as_mut())
            .filter_map(|f| f(ast, node, stack).err())
            .map(|err| err.at(node))
            .collect()
    }

    pub fn fire_leave(&mut self, ast: &Ast, node: NodeId, stack: &Ancestors) -> Vec<HookError> {
        self.hooks
            .iter_mut()
            .filter_map(|hook| hook.on_node_leave.as_mut())
            .filter_map(|f| f(ast, node, stack).err())
            .map(|err| err.at(node))
            .collect()
    }

    pub fn fire_finished(
        &mut self,
        ast: &Ast,
        root: NodeId,
        metadata: Option<&Rc<Metadata>>,
    ) -> Vec<HookError> {
        self.hooks
            .iter_mut()
            .filter_map(|hook| hook.on_finished.as_mut())
            .filter_map(|f| f(ast, root, metadata).err())
            .map(|err| err.at(root))
            .collect()
    }
}

impl HookError {
    fn at(mut self, node: NodeId) -> Self {
        self.node.get_or_insert(node);
        self
    }
}
