//! Bit-granular reader and writer over caller-owned byte buffers.
//!
//! Bits are packed MSB-first within each byte, and multi-bit fields are written
//! big end first. Both sides track a bit cursor and a sticky error flag: once an
//! operation fails for lack of room, [`BitWriter::has_error`] /
//! [`BitReader::has_error`] stay `true` for the rest of the stream's life.

use crate::error::BitstreamError;

type Result<T> = core::result::Result<T, BitstreamError>;

/// Widest field a single `put`/`get` call moves.
const MAX_FIELD_BITS: u32 = 32;

/// Mask selecting bit `offset` within its byte (MSB-first).
#[inline]
const fn bit_mask(offset: usize) -> u8 {
    0x80 >> (offset & 7)
}

/// Rounds `offset` up to the next multiple of `align_bits`.
#[inline]
const fn align_up(offset: usize, align_bits: usize) -> usize {
    if align_bits == 0 {
        offset
    } else {
        offset.div_ceil(align_bits) * align_bits
    }
}

/// Sequential bit writer over a fixed-capacity output slice.
pub struct BitWriter<'a> {
    data: &'a mut [u8],
    offset: usize,
    error: bool,
}

impl<'a> BitWriter<'a> {
    pub const fn new(data: &'a mut [u8]) -> Self {
        Self {
            data,
            offset: 0,
            error: false,
        }
    }

    /// Total capacity of the underlying buffer in bits.
    #[inline]
    const fn capacity_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Reserves `bits` at the cursor, failing (and latching the error flag) if
    /// the buffer cannot hold them.
    fn reserve(&mut self, bits: usize) -> Result<()> {
        if self.offset + bits > self.capacity_bits() {
            self.error = true;
            return Err(BitstreamError::Overflow);
        }
        Ok(())
    }

    /// Writes the low `bits` bits of `value`, most significant first.
    pub fn put(&mut self, value: u32, bits: u32) -> Result<()> {
        debug_assert!(bits <= MAX_FIELD_BITS);
        self.reserve(bits as usize)?;

        for i in (0..bits).rev() {
            let byte = &mut self.data[self.offset >> 3];
            let mask = bit_mask(self.offset);
            if (value >> i) & 1 != 0 {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
            self.offset += 1;
        }
        Ok(())
    }

    /// Advances the cursor without touching the skipped bits.
    pub fn skip(&mut self, bits: u32) -> Result<()> {
        self.reserve(bits as usize)?;
        self.offset += bits as usize;
        Ok(())
    }

    /// Current cursor position in bits.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes touched so far, counting a partial trailing byte.
    #[inline]
    pub const fn len(&self) -> usize {
        self.offset.div_ceil(8)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.offset == 0
    }

    #[inline]
    pub const fn has_error(&self) -> bool {
        self.error
    }

    /// Returns the tail of the buffer starting at the cursor rounded up to
    /// `align_bits`. The cursor itself is not moved.
    pub fn aligned_data(&mut self, align_bits: usize) -> Result<&mut [u8]> {
        let byte = align_up(self.offset, align_bits).div_ceil(8);
        if byte > self.data.len() {
            self.error = true;
            return Err(BitstreamError::Overflow);
        }
        Ok(&mut self.data[byte..])
    }
}

/// Sequential bit reader over an input slice.
pub struct BitReader<'a> {
    data: &'a [u8],
    offset: usize,
    error: bool,
}

impl<'a> BitReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            error: false,
        }
    }

    fn require(&mut self, bits: usize) -> Result<()> {
        if self.offset + bits > self.data.len() * 8 {
            self.error = true;
            return Err(BitstreamError::Exhausted);
        }
        Ok(())
    }

    /// Reads a `bits`-wide field, most significant bit first.
    pub fn get(&mut self, bits: u32) -> Result<u32> {
        debug_assert!(bits <= MAX_FIELD_BITS);
        self.require(bits as usize)?;

        let mut value = 0u32;
        for _ in 0..bits {
            let bit = self.data[self.offset >> 3] & bit_mask(self.offset) != 0;
            value = (value << 1) | u32::from(bit);
            self.offset += 1;
        }
        Ok(value)
    }

    pub fn skip(&mut self, bits: u32) -> Result<()> {
        self.require(bits as usize)?;
        self.offset += bits as usize;
        Ok(())
    }

    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub const fn has_error(&self) -> bool {
        self.error
    }

    /// Returns the input from the cursor rounded up to `align_bits` onward.
    pub fn aligned_data(&mut self, align_bits: usize) -> Result<&'a [u8]> {
        let byte = align_up(self.offset, align_bits).div_ceil(8);
        if byte > self.data.len() {
            self.error = true;
            return Err(BitstreamError::Exhausted);
        }
        Ok(&self.data[byte..])
    }
}
