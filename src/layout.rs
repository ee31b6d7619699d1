//! Mapping between the in-memory bitmap and the canonical on-disk word order.
//!
//! The codec always operates on a flat sequence of 32-bit on-disk blocks. The
//! caller's bitmap is handed over as its 32-bit view (`&[u32]`), which for
//! 64-bit bitmap words holds two halves per word in host memory order. A
//! [`WordLayout`] says how to walk that view so the on-disk sequence is the same
//! on every host: for each wide word the low half comes first, then the high
//! half.
//!
//! With the narrow word hint, each wide word is known to have a zero high half
//! and only the low half is stored, halving the on-disk block count.

use crate::error::{CompressionError, DecompressionError};

/// Width of one in-memory bitmap word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordWidth {
    /// 32-bit words; in-memory and on-disk sequences coincide.
    Narrow,
    /// 64-bit words, each spanning two consecutive 32-bit halves.
    Wide,
}

/// Byte order of the host that owns the in-memory bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Word-order policy shared by the encoder and decoder of a stream.
///
/// The layout is not recorded in the stream. Encoding and decoding with
/// different layouts yields a well-formed but permuted bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordLayout {
    pub width: WordWidth,
    pub byte_order: ByteOrder,
}

impl Default for WordLayout {
    fn default() -> Self {
        Self::native()
    }
}

impl WordLayout {
    /// Plain 32-bit words. Byte order is irrelevant for this width.
    pub const NARROW: Self = Self::new(WordWidth::Narrow, ByteOrder::Little);

    #[must_use]
    pub const fn new(width: WordWidth, byte_order: ByteOrder) -> Self {
        Self { width, byte_order }
    }

    /// The layout of bitmap words on the running host: pointer-sized words in
    /// native byte order.
    #[must_use]
    pub const fn native() -> Self {
        let width = if usize::BITS == 64 {
            WordWidth::Wide
        } else {
            WordWidth::Narrow
        };
        let byte_order = if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        };
        Self::new(width, byte_order)
    }

    #[inline]
    const fn omits_high_half(&self, narrow_hint: bool) -> bool {
        narrow_hint && matches!(self.width, WordWidth::Wide)
    }

    /// Position of the low (`half == 0`) or high (`half == 1`) half of wide
    /// word `pair` within the 32-bit view.
    #[inline]
    const fn half_index(&self, pair: usize, half: usize) -> usize {
        match self.byte_order {
            ByteOrder::Little => 2 * pair + half,
            ByteOrder::Big => 2 * pair + (1 - half),
        }
    }

    /// Number of on-disk blocks needed for `halves` in-memory 32-bit halves.
    pub const fn disk_block_count(
        &self,
        halves: usize,
        narrow_hint: bool,
    ) -> Result<usize, CompressionError> {
        match self.width {
            WordWidth::Narrow => Ok(halves),
            WordWidth::Wide if halves % 2 != 0 => Err(CompressionError::UnpairedHalf(halves)),
            WordWidth::Wide if narrow_hint => Ok(halves / 2),
            WordWidth::Wide => Ok(halves),
        }
    }

    /// Number of in-memory 32-bit halves rebuilt from `blocks` on-disk blocks.
    pub const fn memory_len(
        &self,
        blocks: usize,
        narrow_hint: bool,
    ) -> Result<usize, DecompressionError> {
        match self.width {
            WordWidth::Narrow => Ok(blocks),
            WordWidth::Wide if narrow_hint => Ok(blocks * 2),
            WordWidth::Wide if blocks % 2 != 0 => Err(DecompressionError::UnpairedHalf(blocks)),
            WordWidth::Wide => Ok(blocks),
        }
    }

    /// Index into the in-memory 32-bit view holding on-disk block `block`.
    #[must_use]
    pub const fn memory_index(&self, block: usize, narrow_hint: bool) -> usize {
        match self.width {
            WordWidth::Narrow => block,
            WordWidth::Wide if narrow_hint => self.half_index(block, 0),
            WordWidth::Wide => self.half_index(block / 2, block % 2),
        }
    }

    /// Checks the narrow word hint precondition: every omitted high half is
    /// zero, on either byte order.
    pub fn check_narrow_hint(
        &self,
        words: &[u32],
        narrow_hint: bool,
    ) -> Result<(), CompressionError> {
        if !self.omits_high_half(narrow_hint) {
            return Ok(());
        }
        for pair in 0..words.len() / 2 {
            if words[self.half_index(pair, 1)] != 0 {
                return Err(CompressionError::NarrowHintViolated { index: pair });
            }
        }
        Ok(())
    }

    /// Iterates the in-memory view in on-disk order.
    pub fn disk_words<'a>(
        &self,
        words: &'a [u32],
        narrow_hint: bool,
    ) -> Result<DiskWords<'a>, CompressionError> {
        let blocks = self.disk_block_count(words.len(), narrow_hint)?;
        self.check_narrow_hint(words, narrow_hint)?;
        Ok(DiskWords {
            words,
            layout: *self,
            narrow_hint,
            next: 0,
            blocks,
        })
    }
}

/// Iterator over an in-memory bitmap in canonical on-disk order.
#[derive(Debug, Clone)]
pub struct DiskWords<'a> {
    words: &'a [u32],
    layout: WordLayout,
    narrow_hint: bool,
    next: usize,
    blocks: usize,
}

impl DiskWords<'_> {
    /// Total number of on-disk blocks this iterator yields.
    #[inline]
    pub const fn block_count(&self) -> usize {
        self.blocks
    }
}

impl Iterator for DiskWords<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next >= self.blocks {
            return None;
        }
        let word = self.words[self.layout.memory_index(self.next, self.narrow_hint)];
        self.next += 1;
        Some(word)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.blocks - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DiskWords<'_> {}
