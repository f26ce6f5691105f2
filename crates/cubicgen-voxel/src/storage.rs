//! Palette-compressed block storage for one 16×16×16 cube.
//!
//! Cells hold indices into a local palette of [`BlockId`]s. Indices are packed
//! into `u64` words without straddling word boundaries, so the bit width can be
//! any value from 1 to 16. A cube holding a single block type stores no words.

use serde::{Deserialize, Serialize};

use crate::registry::BlockId;

const CELLS: usize = 16 * 16 * 16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStorage {
    palette: Vec<BlockId>,
    words: Vec<u64>,
    bits: u8,
}

impl BlockStorage {
    /// Storage with every cell set to `fill`.
    pub fn uniform(fill: BlockId) -> Self {
        Self {
            palette: vec![fill],
            words: Vec::new(),
            bits: 0,
        }
    }

    pub fn get(&self, index: usize) -> BlockId {
        debug_assert!(index < CELLS, "cell index out of bounds");
        if self.bits == 0 {
            return self.palette[0];
        }
        self.palette[self.raw(index) as usize]
    }

    pub fn set(&mut self, index: usize, block: BlockId) {
        debug_assert!(index < CELLS, "cell index out of bounds");
        let slot = match self.palette.iter().position(|&b| b == block) {
            Some(slot) => slot,
            None => {
                self.palette.push(block);
                let needed = bits_for(self.palette.len());
                if needed != self.bits {
                    self.repack(needed);
                }
                self.palette.len() - 1
            }
        };
        if self.bits > 0 {
            self.write_raw(index, slot as u16);
        }
    }

    /// Resets every cell to `block`.
    pub fn fill(&mut self, block: BlockId) {
        *self = Self::uniform(block);
    }

    pub fn palette(&self) -> &[BlockId] {
        &self.palette
    }

    /// Bits per cell index; zero when the cube is uniform.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn storage_bytes(&self) -> usize {
        self.words.len() * 8
    }

    fn per_word(bits: u8) -> usize {
        64 / bits as usize
    }

    fn raw(&self, index: usize) -> u16 {
        let per_word = Self::per_word(self.bits);
        let shift = (index % per_word) * self.bits as usize;
        let mask = (1u64 << self.bits) - 1;
        ((self.words[index / per_word] >> shift) & mask) as u16
    }

    fn write_raw(&mut self, index: usize, value: u16) {
        let per_word = Self::per_word(self.bits);
        let shift = (index % per_word) * self.bits as usize;
        let mask = (1u64 << self.bits) - 1;
        let word = &mut self.words[index / per_word];
        *word = (*word & !(mask << shift)) | (u64::from(value) << shift);
    }

    fn repack(&mut self, new_bits: u8) {
        let old = std::mem::replace(
            self,
            Self {
                palette: Vec::new(),
                words: vec![0; CELLS.div_ceil(Self::per_word(new_bits))],
                bits: new_bits,
            },
        );
        if old.bits > 0 {
            for i in 0..CELLS {
                let v = old.raw(i);
                self.write_raw(i, v);
            }
        }
        self.palette = old.palette;
    }
}

impl Default for BlockStorage {
    fn default() -> Self {
        Self::uniform(BlockId::AIR)
    }
}

/// Smallest bit width able to index a palette of `len` entries.
fn bits_for(len: usize) -> u8 {
    if len <= 1 {
        0
    } else {
        (usize::BITS - (len - 1).leading_zeros()) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_uses_no_words() {
        let s = BlockStorage::uniform(BlockId::STONE);
        assert_eq!(s.bits(), 0);
        assert_eq!(s.storage_bytes(), 0);
        assert_eq!(s.get(4095), BlockId::STONE);
    }

    #[test]
    fn test_bits_for_palette_sizes() {
        assert_eq!(bits_for(1), 0);
        assert_eq!(bits_for(2), 1);
        assert_eq!(bits_for(3), 2);
        assert_eq!(bits_for(5), 3);
        assert_eq!(bits_for(17), 5);
        assert_eq!(bits_for(65536), 16);
    }

    #[test]
    fn test_growth_preserves_existing_cells() {
        let mut s = BlockStorage::default();
        for i in 0..CELLS {
            s.set(i, BlockId((i % 7) as u16));
        }
        assert_eq!(s.bits(), 3, "7 block types fit in 3 bits");
        for i in 0..CELLS {
            assert_eq!(s.get(i), BlockId((i % 7) as u16), "cell {i}");
        }
    }

    #[test]
    fn test_non_power_of_two_width_does_not_straddle_words() {
        let mut s = BlockStorage::default();
        for v in 1..=4u16 {
            s.set(v as usize, BlockId(v));
        }
        assert_eq!(s.bits(), 3);
        // 21 entries per word, 4096 cells.
        assert_eq!(s.storage_bytes(), 4096usize.div_ceil(21) * 8);
        s.set(4095, BlockId(4));
        assert_eq!(s.get(4095), BlockId(4));
        assert_eq!(s.get(3), BlockId(3));
    }

    #[test]
    fn test_fill_resets_to_uniform() {
        let mut s = BlockStorage::default();
        s.set(10, BlockId::WATER);
        s.fill(BlockId::DIRT);
        assert_eq!(s.bits(), 0);
        assert_eq!(s.palette(), &[BlockId::DIRT]);
    }
}
