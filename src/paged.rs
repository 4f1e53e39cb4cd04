//! Two-level sparse arrays.
//!
//! Element `i` lives at `blocks[i >> BLOCK_BITS][i & BLOCK_MASK]`. Second-level blocks of
//! `BLOCK_SIZE` elements are allocated the first time any element in them is written, so
//! memory follows the indices actually touched rather than the addressable range (the same
//! idea as a two-level page table). The directory itself grows on demand.

pub const BLOCK_BITS: u32 = 16;
pub const BLOCK_SIZE: usize = 1 << BLOCK_BITS;
const BLOCK_MASK: u64 = (BLOCK_SIZE as u64) - 1;

#[inline(always)]
fn split(i: u64) -> (usize, usize) {
    ((i >> BLOCK_BITS) as usize, (i & BLOCK_MASK) as usize)
}

#[derive(Clone, Debug)]
pub struct PagedVec<T> {
    blocks: Vec<Option<Box<[T]>>>,
    allocated: usize,
}

impl<T> Default for PagedVec<T> {
    fn default() -> Self {
        PagedVec { blocks: Vec::new(), allocated: 0 }
    }
}

impl<T: Copy + Default> PagedVec<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unwritten elements read as `T::default()`.
    #[inline]
    pub fn get(&self, i: u64) -> T {
        let (hi, lo) = split(i);
        match self.blocks.get(hi) {
            Some(Some(block)) => block[lo],
            _ => T::default(),
        }
    }

    /// Mutable access, allocating the containing block if needed.
    #[inline]
    pub fn get_mut(&mut self, i: u64) -> &mut T {
        let (hi, lo) = split(i);
        if hi >= self.blocks.len() {
            self.blocks.resize_with(hi + 1, || None);
        }
        let allocated = &mut self.allocated;
        let block = self.blocks[hi].get_or_insert_with(|| {
            *allocated += 1;
            vec![T::default(); BLOCK_SIZE].into_boxed_slice()
        });
        &mut block[lo]
    }

    #[inline]
    pub fn set(&mut self, i: u64, value: T) {
        *self.get_mut(i) = value;
    }

    /// Contiguous runs covering elements `0..len`, block by block. Missing blocks are
    /// yielded as `None` with the length of the run they would cover.
    pub fn runs(&self, len: u64) -> impl Iterator<Item = (Option<&[T]>, usize)> + '_ {
        let (full, rest) = split(len);
        (0..full + usize::from(rest > 0)).map(move |hi| {
            let n = if hi < full { BLOCK_SIZE } else { rest };
            let block = self.blocks.get(hi).and_then(|b| b.as_deref()).map(|b| &b[..n]);
            (block, n)
        })
    }

    pub fn allocated_blocks(&self) -> usize {
        self.allocated
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated_blocks() * BLOCK_SIZE * std::mem::size_of::<T>()
            + self.blocks.capacity() * std::mem::size_of::<Option<Box<[T]>>>()
    }
}

/// One bit per index, stored as a [`PagedVec`] of 64-bit words.
#[derive(Clone, Debug, Default)]
pub struct PagedBitSet {
    words: PagedVec<u64>,
}

impl PagedBitSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, i: u64) -> bool {
        self.words.get(i >> 6) & (1u64 << (i & 63)) != 0
    }

    /// Sets bit `i`. Returns true if it was previously clear.
    #[inline]
    pub fn test_and_set(&mut self, i: u64) -> bool {
        let mask = 1u64 << (i & 63);
        let word = self.words.get_mut(i >> 6);
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        true
    }

    pub fn allocated_bytes(&self) -> usize {
        self.words.allocated_bytes()
    }
}
