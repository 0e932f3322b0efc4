//! The call tree (spec §3 "Call tree", §4.C "Tracing Environment").
//!
//! `CallTree` is the Rust analogue of `original_source/compiler.py`'s
//! `CallTree`/`Tracer` pair: a rose tree built up by repeatedly re-running a
//! traced program, using a two-phase branch replay to discover every arm of
//! every conditional. The Python implementation mutates a `pointer` plus an
//! aliased `active_path` list reference; this implementation instead tracks
//! a path of `(index, side)` steps from the root and recomputes the active
//! list on demand, which avoids the aliasing the original relies on while
//! producing byte-identical tree shapes.

use crate::expr::Expr;
use std::rc::Rc;

/// The value assigned by an `("assign", name, value)` call-tree node. The
/// traced program may assign either a freshly-built expression or a literal
/// recorded directly (mirrors the Python `int`/`str` fast paths in
/// `VarTracer.__setitem__`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignSource {
    Expr(Rc<Expr>),
    IntLit(u32),
    StrLit(String),
}

/// A build-time argument to an opaque opcode node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpArg {
    Str(String),
    Int(u32),
    List(Vec<String>),
    Pairs(Vec<(String, String)>),
}

/// One node of the call tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallNode {
    Assign(String, AssignSource),
    Lookup(String),
    /// A structured conditional. `left`/`right` are `None` until the
    /// two-phase replay has taken that arm at least once.
    Branch {
        cond: Rc<Expr>,
        left: Option<Vec<CallNode>>,
        right: Option<Vec<CallNode>>,
    },
    /// Any opcode not given special tree-node treatment: control-flow
    /// primitives (`cond`, `pause`, `reactivate`, `fork_inactive`, ...) and
    /// every domain-specific (chess/FEN) opcode alike (spec §4.C, last
    /// paragraph: "This is the mechanism the DSL uses to emit domain ops
    /// directly").
    Op(String, Vec<OpArg>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// The traced call tree plus the cursor state needed to replay it.
#[derive(Debug, Clone, Default)]
pub struct CallTree {
    pub root: Vec<CallNode>,
    path: Vec<(usize, Side)>,
    pointer: usize,
    saved: Vec<(Vec<(usize, Side)>, usize)>,
}

impl CallTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the replay cursor to the root before a new trace pass.
    pub fn restart(&mut self) {
        self.path.clear();
        self.pointer = 0;
        self.saved.clear();
    }

    fn current_list_mut(&mut self) -> &mut Vec<CallNode> {
        let mut list = &mut self.root;
        for &(idx, side) in &self.path {
            list = match &mut list[idx] {
                CallNode::Branch { left, right, .. } => match side {
                    Side::Left => left.as_mut().expect("left subtree missing on known path"),
                    Side::Right => right.as_mut().expect("right subtree missing on known path"),
                },
                other => panic!("path step does not point at a branch node: {other:?}"),
            };
        }
        list
    }

    /// Record (or re-verify) a leaf node at the current cursor position.
    /// Mirrors `CallTree.append`: if the program has already recorded a node
    /// here from a previous pass it must match exactly, otherwise a new node
    /// is appended (the traced program must be deterministic given its
    /// decision history).
    pub fn append(&mut self, node: CallNode) {
        let pointer = self.pointer;
        let list = self.current_list_mut();
        if pointer < list.len() {
            assert_eq!(
                list[pointer], node,
                "traced program is non-deterministic: recorded node differs on replay"
            );
        } else {
            list.push(node);
        }
        self.pointer += 1;
    }

    /// Two-phase branch replay (spec §4.C). Returns `true` to descend the
    /// left (then) arm, `false` for the right (else) arm.
    pub fn branch(&mut self, cond: &Rc<Expr>) -> bool {
        self.saved.push((self.path.clone(), self.pointer));

        let pointer = self.pointer;
        let list = self.current_list_mut();
        let went_left;

        if pointer < list.len() {
            match &mut list[pointer] {
                CallNode::Branch { left, right, .. } => {
                    if !Self::subtree_complete(left) {
                        if left.is_none() {
                            *left = Some(Vec::new());
                        }
                        went_left = true;
                    } else {
                        if right.is_none() {
                            *right = Some(Vec::new());
                        }
                        went_left = false;
                    }
                }
                other => panic!("expected branch node at cursor, found {other:?}"),
            }
        } else {
            list.push(CallNode::Branch {
                cond: cond.clone(),
                left: Some(Vec::new()),
                right: None,
            });
            went_left = true;
        }

        self.path.push((pointer, if went_left { Side::Left } else { Side::Right }));
        self.pointer = 0;
        went_left
    }

    /// Rejoin a branch's sibling subtrees after both arms of an `if`/`else`
    /// have been visited for this pass (spec §4.C "merge primitive").
    pub fn merge(&mut self) {
        let (path, pointer) = self.saved.pop().expect("merge() without matching branch()");
        self.path = path;
        self.pointer = pointer + 1;
    }

    fn subtree_complete(path: &Option<Vec<CallNode>>) -> bool {
        match path {
            None => false,
            Some(nodes) => Self::list_complete(nodes),
        }
    }

    fn list_complete(nodes: &[CallNode]) -> bool {
        nodes.iter().all(|n| match n {
            CallNode::Branch { left, right, .. } => {
                left.is_some() && right.is_some() && Self::subtree_complete(left) && Self::subtree_complete(right)
            }
            _ => true,
        })
    }

    /// Spec §3 invariant: after tracing completes, no branch child is still
    /// `None` (§8 property 6, "Branch coverage").
    pub fn is_complete(&self) -> bool {
        !self.root.is_empty() && Self::list_complete(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Traced;

    #[test]
    fn linear_program_has_no_branches() {
        let mut tree = CallTree::new();
        tree.append(CallNode::Assign("a".into(), AssignSource::IntLit(1)));
        tree.append(CallNode::Lookup("a".into()));
        assert!(tree.is_complete());
        assert_eq!(tree.root.len(), 2);
    }

    #[test]
    fn branch_explores_both_arms_across_passes() {
        let mut tree = CallTree::new();
        let cond = Traced::boolean(true).expr;

        for _ in 0..10 {
            tree.restart();
            if tree.branch(&cond) {
                tree.append(CallNode::Assign("r".into(), AssignSource::StrLit("yes".into())));
            } else {
                tree.append(CallNode::Assign("r".into(), AssignSource::StrLit("no".into())));
            }
            tree.merge();
            if tree.is_complete() {
                break;
            }
        }

        assert!(tree.is_complete());
        match &tree.root[0] {
            CallNode::Branch { left, right, .. } => {
                assert_eq!(left.as_ref().unwrap().len(), 1);
                assert_eq!(right.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }
}
