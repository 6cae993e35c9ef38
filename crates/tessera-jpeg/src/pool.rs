/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Scratch blocks for the inverse DCT
//!
//! Each worker owns a pool. A block is checked out with [`BlockPool::take`]
//! and goes back to the pool when the returned handle is dropped.

use core::cell::{Cell, RefCell};
use core::ops::{Deref, DerefMut};

/// A pool of 64 coefficient scratch blocks
#[derive(Default)]
pub(crate) struct BlockPool {
    free:      RefCell<Vec<Box<[i32; 64]>>>,
    allocated: Cell<usize>
}

impl BlockPool {
    pub(crate) fn new() -> BlockPool {
        BlockPool::default()
    }

    /// Check out a zeroed block
    pub(crate) fn take(&self) -> PooledBlock<'_> {
        let block = match self.free.borrow_mut().pop() {
            Some(mut block) => {
                block.fill(0);
                block
            }
            None => {
                self.allocated.set(self.allocated.get() + 1);
                Box::new([0; 64])
            }
        };

        PooledBlock {
            block: Some(block),
            pool:  self
        }
    }

    /// Number of blocks this pool ever had to allocate
    pub(crate) fn allocated(&self) -> usize {
        self.allocated.get()
    }
}

/// A block borrowed from a [`BlockPool`]
pub(crate) struct PooledBlock<'a> {
    block: Option<Box<[i32; 64]>>,
    pool:  &'a BlockPool
}

impl Deref for PooledBlock<'_> {
    type Target = [i32; 64];

    fn deref(&self) -> &[i32; 64] {
        // only empty while being dropped
        self.block.as_deref().unwrap_or(&[0; 64])
    }
}

impl DerefMut for PooledBlock<'_> {
    fn deref_mut(&mut self) -> &mut [i32; 64] {
        self.block.get_or_insert_with(|| Box::new([0; 64]))
    }
}

impl Drop for PooledBlock<'_> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.pool.free.borrow_mut().push(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BlockPool;

    #[test]
    fn blocks_are_reused() {
        let pool = BlockPool::new();

        for i in 0..10 {
            let mut block = pool.take();
            assert!(block.iter().all(|x| *x == 0));
            block[0] = i;
        }
        assert_eq!(pool.allocated(), 1);

        let first = pool.take();
        let second = pool.take();
        assert_eq!(pool.allocated(), 2);
        drop((first, second));

        let _third = pool.take();
        assert_eq!(pool.allocated(), 2);
    }
}
