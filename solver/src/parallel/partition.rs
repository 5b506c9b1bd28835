use std::ops::Range;

/// Static split of the outer pair loop between ranks and their threads.
///
/// Outer indices `0..natoms - 1` (the last atom has no partner with a larger
/// index) are cut into `ranks` contiguous blocks, every block into `threads`
/// contiguous sub-blocks. Sizes differ by at most one index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    natoms: usize,
    ranks: usize,
    threads: usize,
}

fn split(range: Range<usize>, parts: usize, part: usize) -> Range<usize> {
    let len = range.end - range.start;
    range.start + len * part / parts..range.start + len * (part + 1) / parts
}

impl Partition {
    /// `ranks` and `threads` are clamped to at least one.
    pub fn new(natoms: usize, ranks: usize, threads: usize) -> Self {
        Partition {
            natoms,
            ranks: ranks.max(1),
            threads: threads.max(1),
        }
    }

    pub fn natoms(&self) -> usize {
        self.natoms
    }

    pub fn ranks(&self) -> usize {
        self.ranks
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Outer indices handled by `rank`.
    pub fn rank_range(&self, rank: usize) -> Range<usize> {
        split(0..self.natoms.saturating_sub(1), self.ranks, rank)
    }

    /// Outer indices handled by `thread` of `rank`.
    pub fn outer_range(&self, rank: usize, thread: usize) -> Range<usize> {
        split(self.rank_range(rank), self.threads, thread)
    }
}
