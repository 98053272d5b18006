//! Label stack for structured control flow
//!
//! Each active `block`, `loop` or `if` pushes a [`Label`] recording the
//! operand stack height on entry and how many values a branch to it carries.
//! A branch keeps that many values from the top of the stack, drops the rest
//! down to the entry height, and signals the target depth outward as a
//! [`BlockEnd`].

use crate::parser::instruction::BlockType;

/// How an instruction sequence finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEnd {
    /// Ran to the end
    Normal,
    /// Branch pending to the label this many levels out (0 = innermost)
    Branch(u32),
    /// `return` pending; absorbed at the function boundary
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelType {
    Block,
    /// Branches re-enter the loop instead of leaving it
    Loop,
    If,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub label_type: LabelType,
    pub block_type: BlockType,
    /// Operand stack height when the construct was entered
    pub stack_height: usize,
}

impl Label {
    pub fn new(label_type: LabelType, block_type: BlockType, stack_height: usize) -> Self {
        Label {
            label_type,
            block_type,
            stack_height,
        }
    }

    /// Values carried by a branch to this label. Loops take their
    /// parameters, which single-result block types never declare.
    pub fn arity(&self) -> usize {
        match self.label_type {
            LabelType::Loop => 0,
            LabelType::Block | LabelType::If => self.block_type.arity(),
        }
    }
}

#[derive(Debug, Default)]
pub struct LabelStack {
    labels: Vec<Label>,
}

impl LabelStack {
    pub fn new() -> Self {
        LabelStack { labels: Vec::new() }
    }

    pub fn push(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn pop(&mut self) -> Option<Label> {
        self.labels.pop()
    }

    /// The label `depth` levels out from the top (0 = top)
    pub fn get(&self, depth: u32) -> Option<&Label> {
        let len = self.labels.len();
        if depth as usize >= len {
            return None;
        }
        self.labels.get(len - 1 - depth as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::module::ValueType;

    #[test]
    fn get_counts_from_top() {
        let mut labels = LabelStack::new();
        labels.push(Label::new(LabelType::Block, BlockType::Empty, 0));
        labels.push(Label::new(LabelType::Loop, BlockType::Empty, 2));

        assert_eq!(labels.get(0).unwrap().label_type, LabelType::Loop);
        assert_eq!(labels.get(1).unwrap().stack_height, 0);
        assert!(labels.get(2).is_none());
        assert_eq!(labels.depth(), 2);
    }

    #[test]
    fn arity_by_kind() {
        let block = Label::new(LabelType::Block, BlockType::Value(ValueType::I32), 0);
        let looped = Label::new(LabelType::Loop, BlockType::Value(ValueType::I32), 0);
        assert_eq!(block.arity(), 1);
        assert_eq!(looped.arity(), 0);
    }
}
