//! Property-based tests over randomly shaped statement trees.

mod common;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use common::{TreeBuilder, arb_program, bodies_are_blocks, record_visits};
use ecma_walker::{BlockNormalizer, DefaultVisitor, Hook, NodeId, Visitor, Walker, utils::node_kind_trace};
use proptest::prelude::*;

proptest! {
    /// Property: the default traversal enters every node exactly once.
    #[test]
    fn default_traversal_covers_every_node(stmts in arb_program()) {
        let mut tree = TreeBuilder::new();
        let root = tree.build_program(&stmts);

        let mut visitor = DefaultVisitor::new();
        let visits = record_visits(&mut visitor);
        Walker::new(&mut tree.ast).begin(&mut visitor, root).unwrap();

        let mut seen = visits.borrow().clone();
        seen.sort_by_key(|id| id.0);
        let all: Vec<_> = (0..tree.ast.nodes.len()).map(NodeId).collect();
        prop_assert_eq!(seen, all);
    }

    /// Property: each node's ancestor path extends its parent's path by one frame.
    #[test]
    fn stack_depth_follows_tree_depth(stmts in arb_program()) {
        let mut tree = TreeBuilder::new();
        let root = tree.build_program(&stmts);

        let paths: Rc<RefCell<HashMap<NodeId, Vec<NodeId>>>> = Rc::default();
        let sink = paths.clone();
        let mut visitor = DefaultVisitor::new();
        visitor.add_hook(Hook::new().on_enter(move |_, node, stack| {
            let path = stack.nodes();
            assert_eq!(path.last(), Some(&node));
            assert_eq!(stack.len(), path.len() + 1);
            if let [.., parent, _] = path.as_slice() {
                let paths = sink.borrow();
                assert_eq!(paths[parent].as_slice(), &path[..path.len() - 1]);
            }
            sink.borrow_mut().insert(node, path);
            Ok(())
        }));
        Walker::new(&mut tree.ast).begin(&mut visitor, root).unwrap();

        prop_assert_eq!(paths.borrow().len(), tree.ast.nodes.len());
    }

    /// Property: normalization leaves only block bodies and is idempotent.
    #[test]
    fn normalization_is_idempotent(stmts in arb_program()) {
        let mut tree = TreeBuilder::new();
        let root = tree.build_program(&stmts);

        let mut normalizer = BlockNormalizer::new(true);
        let first = node_kind_trace(&mut Walker::new(&mut tree.ast), &mut normalizer, root).unwrap();
        prop_assert!(bodies_are_blocks(&tree.ast, root));
        let size = tree.ast.nodes.len();

        let second = node_kind_trace(&mut Walker::new(&mut tree.ast), &mut normalizer, root).unwrap();
        prop_assert_eq!(tree.ast.nodes.len(), size);
        prop_assert_eq!(first, second);
    }

    /// Property: with bodies kept, the rewriter is a plain traversal.
    #[test]
    fn disabled_normalizer_matches_default(stmts in arb_program()) {
        let mut tree = TreeBuilder::new();
        let root = tree.build_program(&stmts);
        let size = tree.ast.nodes.len();

        let default = node_kind_trace(&mut Walker::new(&mut tree.ast), &mut DefaultVisitor::new(), root).unwrap();
        let kept = node_kind_trace(&mut Walker::new(&mut tree.ast), &mut BlockNormalizer::new(false), root).unwrap();
        prop_assert_eq!(tree.ast.nodes.len(), size);
        prop_assert_eq!(default, kept);
    }
}
