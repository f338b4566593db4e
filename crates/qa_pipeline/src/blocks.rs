//! Block Builder: group catalog items by brand.
//!
//! Blocks come out in first-appearance order (`origin` = position of the
//! brand's first item). Within a block, items keep catalog order, or are
//! stably sorted by sequence key (absent last) in backlog mode.

use qa_core::determinism::sort_items_by_sequence;
use qa_core::{Block, Item};

pub fn build_blocks(items: &[Item], backlog_mode: bool) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block<'_>> = Vec::new();
    for it in items {
        match blocks.iter_mut().find(|b| b.brand == it.brand) {
            Some(b) => b.items.push(it),
            None => blocks.push(Block { brand: it.brand.clone(), items: vec![it], origin: it.position }),
        }
    }
    if backlog_mode {
        for b in &mut blocks {
            sort_items_by_sequence(&mut b.items);
        }
    }
    blocks
}
