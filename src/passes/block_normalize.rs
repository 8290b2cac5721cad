use tracing::debug;

use crate::{
    ast::{Ast, NodeId, NodeKind},
    hooks::HookRegistry,
    metadata::Ancestors,
    passes::{fields, mismatch, *},
    walker::{WalkResult, Walker},
};

// Assigns an already computed value to one field of a struct-like variant.
macro_rules! set_field {
    ($ast:expr, $node:expr, $variant:ident { $field:ident } = $value:expr) => {
        if let Some(NodeKind::$variant { $field, .. }) = $ast.kind_mut($node) {
            *$field = $value;
        }
    };
}

/// Rewrites every control-flow body into an explicit block before walking it.
///
/// Bodies that already are a `BlockStatement` are left alone, so running the
/// pass twice over the same tree changes nothing the second time. With
/// `all_blocks` off it behaves exactly like [`DefaultVisitor`].
pub struct BlockNormalizer {
    pub hooks: HookRegistry,
    all_blocks: bool,
}

impl BlockNormalizer {
    pub fn new(all_blocks: bool) -> Self {
        Self {
            hooks: HookRegistry::new(),
            all_blocks,
        }
    }

    pub fn all_blocks(&self) -> bool {
        self.all_blocks
    }
}

/// Wraps `stmt` in a new single-statement block. Returns `None` when `stmt`
/// already is a block or does not resolve (the walk reports the latter).
fn wrap_statement(ast: &mut Ast, stmt: NodeId) -> Option<NodeId> {
    let loc = match ast.get_node(stmt) {
        Some(node) if !matches!(node.kind, NodeKind::BlockStatement(_)) => node.loc.clone(),
        _ => return None,
    };
    let block = ast.add_node(NodeKind::BlockStatement(vec![stmt]), loc);
    debug!(stmt = stmt.0, block = block.0, "wrapped statement in block");
    Some(block)
}

/// Block for a statement list, or `None` when the list is exactly one block.
fn wrap_list(ast: &mut Ast, owner: NodeId, list: &[NodeId]) -> Option<NodeId> {
    if let [single] = list {
        if ast.is_block(*single) {
            return None;
        }
    }
    let loc = match list.first().and_then(|&first| ast.loc(first)) {
        Some(loc) => loc.clone(),
        None => ast.loc(owner)?.clone(),
    };
    let block = ast.add_node(NodeKind::BlockStatement(list.to_vec()), loc);
    debug!(owner = owner.0, block = block.0, len = list.len(), "wrapped statement list in block");
    Some(block)
}

/// Empty block standing in for an absent branch of `owner`.
fn empty_block(ast: &mut Ast, owner: NodeId) -> Option<NodeId> {
    let loc = ast.loc(owner)?.clone();
    let block = ast.add_node(NodeKind::BlockStatement(Vec::new()), loc);
    debug!(owner = owner.0, block = block.0, "materialized empty block");
    Some(block)
}

impl Visitor for BlockNormalizer {
    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
    fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    fn visit_program(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = match w.ast().kind(node) {
                Some(NodeKind::Program(program)) => program.body.clone(),
                other => return Err(mismatch(node, "Program", other)),
            };
            if let Some(block) = wrap_list(w.ast_mut(), node, &body) {
                if let Some(NodeKind::Program(program)) = w.ast_mut().kind_mut(node) {
                    program.body = vec![block];
                }
            }
        }
        walk_program(self, w, node, stack)
    }

    fn visit_function(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = match w.ast().kind(node) {
                Some(NodeKind::FunctionLiteral(func)) => func.body,
                other => return Err(mismatch(node, "FunctionLiteral", other)),
            };
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                if let Some(NodeKind::FunctionLiteral(func)) = w.ast_mut().kind_mut(node) {
                    func.body = block;
                }
            }
        }
        walk_function(self, w, node, stack)
    }

    fn visit_while(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = fields!(w, node, WhileStatement { body });
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                set_field!(w.ast_mut(), node, WhileStatement { body } = block);
            }
        }
        walk_while(self, w, node, stack)
    }

    fn visit_do_while(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = fields!(w, node, DoWhileStatement { body });
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                set_field!(w.ast_mut(), node, DoWhileStatement { body } = block);
            }
        }
        walk_do_while(self, w, node, stack)
    }

    fn visit_for(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = fields!(w, node, ForStatement { body });
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                set_field!(w.ast_mut(), node, ForStatement { body } = block);
            }
        }
        walk_for(self, w, node, stack)
    }

    fn visit_for_in(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = fields!(w, node, ForInStatement { body });
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                set_field!(w.ast_mut(), node, ForInStatement { body } = block);
            }
        }
        walk_for_in(self, w, node, stack)
    }

    fn visit_if(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let (consequent, alternate) = fields!(w, node, IfStatement { consequent, alternate });
            if let Some(block) = wrap_statement(w.ast_mut(), consequent) {
                set_field!(w.ast_mut(), node, IfStatement { consequent } = block);
            }
            let alternate = match alternate {
                Some(alternate) => wrap_statement(w.ast_mut(), alternate),
                None => empty_block(w.ast_mut(), node),
            };
            if let Some(block) = alternate {
                set_field!(w.ast_mut(), node, IfStatement { alternate } = Some(block));
            }
        }
        walk_if(self, w, node, stack)
    }

    fn visit_labelled(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let statement = fields!(w, node, LabelledStatement { statement });
            if let Some(block) = wrap_statement(w.ast_mut(), statement) {
                set_field!(w.ast_mut(), node, LabelledStatement { statement } = block);
            }
        }
        walk_labelled(self, w, node, stack)
    }

    fn visit_try(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let (body, finally) = fields!(w, node, TryStatement { body, finally });
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                set_field!(w.ast_mut(), node, TryStatement { body } = block);
            }
            let finally = match finally {
                Some(finally) => wrap_statement(w.ast_mut(), finally),
                None => empty_block(w.ast_mut(), node),
            };
            if let Some(block) = finally {
                set_field!(w.ast_mut(), node, TryStatement { finally } = Some(block));
            }
        }
        walk_try(self, w, node, stack)
    }

    fn visit_catch(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = fields!(w, node, CatchStatement { body });
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                set_field!(w.ast_mut(), node, CatchStatement { body } = block);
            }
        }
        walk_catch(self, w, node, stack)
    }

    fn visit_with(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let body = fields!(w, node, WithStatement { body });
            if let Some(block) = wrap_statement(w.ast_mut(), body) {
                set_field!(w.ast_mut(), node, WithStatement { body } = block);
            }
        }
        walk_with(self, w, node, stack)
    }

    fn visit_case(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        if self.all_blocks {
            let consequent = fields!(w, node, CaseStatement { consequent });
            if let Some(block) = wrap_list(w.ast_mut(), node, &consequent) {
                set_field!(w.ast_mut(), node, CaseStatement { consequent } = vec![block]);
            }
        }
        walk_case(self, w, node, stack)
    }
}
