//! Instruction tree reconstruction
//!
//! The node reports inner instructions as one flat list per top-level
//! instruction. Nesting is recovered by pairing every inner instruction with
//! the next entry of the log-derived [`StackHeightSequence`]. The pairing is
//! purely positional; running out of heights means the two sequences have
//! drifted apart and the reconstruction is rejected.

use solana_sdk::instruction::Instruction;

use crate::{
    error::ReconstructError,
    resolver::resolve_instruction,
    snapshot::TransactionSnapshot,
};

// ============================================================================
// Stack Heights
// ============================================================================

/// Call depth of every inner invocation, in emission order.
///
/// `1` is an instruction invoked directly by a top-level instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackHeightSequence(Vec<usize>);

impl StackHeightSequence {
    pub fn new(heights: Vec<usize>) -> Self {
        Self(heights)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cursor(&self) -> StackHeightCursor<'_> {
        StackHeightCursor {
            heights: &self.0,
            position: 0,
        }
    }
}

/// Read position into a [`StackHeightSequence`].
///
/// Passed by value through the builder and handed back advanced, so every
/// top-level instruction consumes its own contiguous sub-slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackHeightCursor<'a> {
    heights: &'a [usize],
    position: usize,
}

impl<'a> StackHeightCursor<'a> {
    /// The next height and the cursor past it, or `None` when exhausted.
    pub fn advance(self) -> Option<(usize, Self)> {
        let height = *self.heights.get(self.position)?;
        Some((
            height,
            Self {
                heights: self.heights,
                position: self.position + 1,
            },
        ))
    }

    pub fn consumed(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.heights.len() - self.position
    }
}

// ============================================================================
// Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTreeNode {
    pub instruction: Instruction,
    /// `0` for top-level instructions.
    pub stack_height: usize,
    pub children: Vec<InstructionTreeNode>,
}

impl InstructionTreeNode {
    pub fn new(instruction: Instruction, stack_height: usize) -> Self {
        Self {
            instruction,
            stack_height,
            children: Vec::new(),
        }
    }

    /// Pre-order walk: the node itself, then each child subtree left to right.
    pub fn walk(&self) -> Vec<&InstructionTreeNode> {
        let mut out = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            out.push(node);
            pending.extend(node.children.iter().rev());
        }
        out
    }

    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Nest `inner` under `root` using heights read from `cursor`.
///
/// Returns the finished node and the cursor advanced past the heights it
/// consumed.
pub fn build_instruction_tree<'a>(
    top_level_index: usize,
    root: Instruction,
    inner: Vec<Instruction>,
    cursor: StackHeightCursor<'a>,
) -> Result<(InstructionTreeNode, StackHeightCursor<'a>), ReconstructError> {
    let mut root = InstructionTreeNode::new(root, 0);
    let mut open: Vec<InstructionTreeNode> = Vec::new();
    let mut cursor = cursor;

    for (inner_index, instruction) in inner.into_iter().enumerate() {
        let (height, next) =
            cursor
                .advance()
                .ok_or(ReconstructError::StackHeightExhausted {
                    top_level_index,
                    inner_index,
                    consumed: cursor.consumed(),
                })?;
        cursor = next;

        while open.last().is_some_and(|node| node.stack_height >= height) {
            close_top(&mut open, &mut root);
        }
        open.push(InstructionTreeNode::new(instruction, height));
    }

    while !open.is_empty() {
        close_top(&mut open, &mut root);
    }

    Ok((root, cursor))
}

/// Pop the innermost open node and attach it to its parent.
fn close_top(open: &mut Vec<InstructionTreeNode>, root: &mut InstructionTreeNode) {
    if let Some(node) = open.pop() {
        match open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.children.push(node),
        }
    }
}

/// Resolve every instruction of `snapshot` and nest the inner ones.
///
/// Produces exactly one root per top-level instruction, in message order.
pub fn build_instruction_forest(
    snapshot: &TransactionSnapshot,
    heights: &StackHeightSequence,
) -> Result<Vec<InstructionTreeNode>, ReconstructError> {
    let instruction_count = snapshot.instructions.len();
    if let Some(orphan) = snapshot
        .inner_instructions
        .iter()
        .find(|group| group.index as usize >= instruction_count)
    {
        return Err(ReconstructError::OrphanInnerInstructions {
            index: orphan.index,
            count: instruction_count,
        });
    }

    let header = &snapshot.header;
    let keys = &snapshot.account_keys;
    let mut cursor = heights.cursor();
    let mut forest = Vec::with_capacity(instruction_count);

    for (index, compiled) in snapshot.instructions.iter().enumerate() {
        let root = resolve_instruction(compiled, header, keys)?;
        let inner = snapshot
            .inner_instructions
            .iter()
            .filter(|group| group.index as usize == index)
            .flat_map(|group| group.instructions.iter())
            .map(|compiled| resolve_instruction(compiled, header, keys))
            .collect::<Result<Vec<_>, _>>()?;

        let (node, next) = build_instruction_tree(index, root, inner, cursor)?;
        tracing::trace!(
            index,
            children = node.children.len(),
            descendants = node.descendant_count(),
            "build_instruction_forest: instruction nested"
        );
        cursor = next;
        forest.push(node);
    }

    if cursor.remaining() > 0 {
        // Logs saw more invocations than the node reported; the tree is still
        // consistent for every instruction that was paired.
        tracing::warn!(
            signature = %snapshot.signature,
            leftover = cursor.remaining(),
            "build_instruction_forest: unused stack heights"
        );
    }

    Ok(forest)
}
