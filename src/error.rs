use thiserror::Error;

/// Failures raised by the bit-level reader and writer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitstreamError {
    #[error("Write would exceed output capacity")]
    Overflow,

    #[error("Read past end of input")]
    Exhausted,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    #[error("Block count {0} exceeds the 12-bit header limit")]
    TooManyBlocks(usize),

    #[error("Output capacity {capacity} bytes is below the uncompressed bound of {required} bytes")]
    InsufficientCapacity { capacity: usize, required: usize },

    #[error("Wide word layout needs an even number of 32-bit halves, got {0}")]
    UnpairedHalf(usize),

    #[error("Narrow word hint set but the high half of wide word {index} is non-zero")]
    NarrowHintViolated { index: usize },

    #[error("Unknown compression type {0}")]
    InvalidCompressionType(u32),

    #[error("Bitstream failure while writing header: {0}")]
    Bitstream(#[from] BitstreamError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompressionError {
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    #[error("Invalid block header")]
    InvalidHeader,

    #[error("Block count {block_count} exceeds output capacity of {capacity} words")]
    BlockCountExceedsCapacity { block_count: usize, capacity: usize },

    #[error("Wide word layout needs an even block count, got {0}")]
    UnpairedHalf(usize),

    #[error("Repeat marker at block 0 has no previous block")]
    RepeatWithoutPrevious,

    #[error("Stream ended inside a repeat run with {remaining} blocks left")]
    TrailingRepeat { remaining: u32 },

    #[error("Input buffer too short for expected data")]
    InputTooShort,

    #[error("Stream state has already been decoded")]
    AlreadyDecoded,
}
