//! CFG navigation helpers over builder-supplied flow graphs.
//!
//! Provides the dominance-respecting block traversal that analysis passes
//! rely on: every block is visited after its immediate dominator, and each
//! block exactly once, so loop back-edges never cause re-entry and a value's
//! definition is always enumerated before any use of it.

use crate::ir::{BasicBlock, EdgeKind, Function, Instruction};
use std::collections::HashMap;

/// A traversable view of a function's CFG.
pub struct Cfg<'a> {
    func: &'a Function,
    successors: HashMap<u32, Vec<(u32, &'a EdgeKind)>>,
    predecessors: HashMap<u32, Vec<(u32, &'a EdgeKind)>>,
    block_map: HashMap<u32, &'a BasicBlock>,
}

impl<'a> Cfg<'a> {
    /// Build traversal indices from a deserialized function.
    pub fn from_function(func: &'a Function) -> Self {
        let mut successors: HashMap<u32, Vec<(u32, &EdgeKind)>> = HashMap::new();
        let mut predecessors: HashMap<u32, Vec<(u32, &EdgeKind)>> = HashMap::new();
        let mut block_map = HashMap::new();

        for block in &func.blocks {
            block_map.insert(block.id, block);
            successors.entry(block.id).or_default();
            predecessors.entry(block.id).or_default();
        }

        for edge in &func.cfg_edges {
            successors
                .entry(edge.from_block)
                .or_default()
                .push((edge.to_block, &edge.kind));
            predecessors
                .entry(edge.to_block)
                .or_default()
                .push((edge.from_block, &edge.kind));
        }

        Self {
            func,
            successors,
            predecessors,
            block_map,
        }
    }

    /// Entry block (always block 0 in the builder's numbering).
    pub fn entry_block(&self) -> Option<&'a BasicBlock> {
        self.block_map.get(&0).copied()
    }

    /// Get block by ID.
    pub fn block(&self, id: u32) -> Option<&'a BasicBlock> {
        self.block_map.get(&id).copied()
    }

    /// Successors of a block.
    pub fn successors(&self, block_id: u32) -> &[(u32, &'a EdgeKind)] {
        self.successors
            .get(&block_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Predecessors of a block.
    pub fn predecessors(&self, block_id: u32) -> &[(u32, &'a EdgeKind)] {
        self.predecessors
            .get(&block_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.func.blocks.len()
    }

    /// Reverse post-order over reachable blocks (entry first).
    pub fn reverse_postorder(&self) -> Vec<u32> {
        let mut visited = std::collections::HashSet::new();
        let mut postorder = Vec::new();

        if let Some(entry) = self.entry_block() {
            self.dfs_postorder(entry.id, &mut visited, &mut postorder);
        }

        postorder.reverse();
        postorder
    }

    fn dfs_postorder(
        &self,
        block_id: u32,
        visited: &mut std::collections::HashSet<u32>,
        postorder: &mut Vec<u32>,
    ) {
        if !visited.insert(block_id) {
            return;
        }
        for &(succ_id, _) in self.successors(block_id) {
            self.dfs_postorder(succ_id, visited, postorder);
        }
        postorder.push(block_id);
    }

    /// Immediate dominator of every reachable block except the entry.
    ///
    /// Iterative dataflow over reverse postorder (Cooper/Harvey/Kennedy).
    /// Converges in a handful of passes for reducible CFGs.
    pub fn immediate_dominators(&self) -> HashMap<u32, u32> {
        let rpo = self.reverse_postorder();
        if rpo.is_empty() {
            return HashMap::new();
        }
        let entry = rpo[0];
        let rpo_num: HashMap<u32, usize> =
            rpo.iter().enumerate().map(|(i, &b)| (b, i)).collect();

        let mut idom: HashMap<u32, u32> = HashMap::new();
        idom.insert(entry, entry);

        let intersect = |idom: &HashMap<u32, u32>, mut a: u32, mut b: u32| -> u32 {
            while a != b {
                while rpo_num[&a] > rpo_num[&b] {
                    a = idom[&a];
                }
                while rpo_num[&b] > rpo_num[&a] {
                    b = idom[&b];
                }
            }
            a
        };

        let mut changed = true;
        while changed {
            changed = false;
            for &b in rpo.iter().skip(1) {
                // First already-processed predecessor seeds the meet.
                let mut new_idom: Option<u32> = None;
                for &(pred, _) in self.predecessors(b) {
                    if !idom.contains_key(&pred) {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(cur) => intersect(&idom, pred, cur),
                    });
                }
                if let Some(new_idom) = new_idom {
                    if idom.get(&b) != Some(&new_idom) {
                        idom.insert(b, new_idom);
                        changed = true;
                    }
                }
            }
        }

        idom.remove(&entry);
        idom
    }

    /// Dominance-respecting preorder over reachable blocks.
    ///
    /// Preorder walk of the dominator tree: a block appears after its
    /// immediate dominator, each block exactly once. Children are visited
    /// in block-id order so the result is deterministic. Unreachable
    /// blocks are skipped.
    pub fn dom_preorder(&self) -> Vec<u32> {
        let rpo = self.reverse_postorder();
        let Some(&entry) = rpo.first() else {
            return Vec::new();
        };
        let idom = self.immediate_dominators();

        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for (&b, &d) in &idom {
            children.entry(d).or_default().push(b);
        }
        for kids in children.values_mut() {
            kids.sort_unstable();
        }

        let mut order = Vec::with_capacity(rpo.len());
        let mut stack = vec![entry];
        while let Some(b) = stack.pop() {
            order.push(b);
            if let Some(kids) = children.get(&b) {
                for &k in kids.iter().rev() {
                    stack.push(k);
                }
            }
        }
        order
    }

    /// All instructions of the function in dominance-respecting order.
    ///
    /// This is the traversal analysis passes iterate: definitions are
    /// enumerated before any instruction that uses them. Restartable; the
    /// flow graph is never mutated.
    pub fn instructions(&self) -> impl Iterator<Item = &'a Instruction> + '_ {
        self.dom_preorder()
            .into_iter()
            .filter_map(move |id| self.block(id))
            .flat_map(|b| b.instructions.iter())
    }
}
