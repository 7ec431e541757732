use std::ops::{DerefMut};

mod mmap;
pub use mmap::{Mmap};

mod vec;
pub use vec::{VecU8};

/// The number of bytes in one code word. Every A32 instruction and every
/// integer pool entry occupies exactly one word; a double-precision pool
/// entry occupies two.
pub const WORD_BYTES: usize = 4;

/// A byte area holding emitted code, with a write pointer. Positions are
/// byte offsets from the start of the area; the emitter keeps them
/// word-aligned.
pub trait Buffer: DerefMut<Target=[u8]> {
    /// Get the write pointer.
    fn get_pos(&self) -> usize;

    /// Set the write pointer.
    fn set_pos(&mut self, pos: usize);

    /// Writes a single byte at the write pointer, incrementing it.
    fn write_byte(&mut self, byte: u8) {
        let pos = self.get_pos();
        self[pos] = byte;
        self.set_pos(pos + 1);
    }

    /// Writes a code word (little-endian) at the write pointer, as if using
    /// `write_byte()` repeatedly.
    fn write_word(&mut self, mut word: u32) {
        for _ in 0..WORD_BYTES {
            self.write_byte(word as u8);
            word >>= 8;
        }
    }

    /// Reads the code word at byte offset `pos`, which must be in bounds.
    fn read_word(&self, pos: usize) -> u32 {
        let mut word: u32 = 0;
        for i in (0..WORD_BYTES).rev() {
            word <<= 8;
            word |= u32::from(self[pos + i]);
        }
        word
    }

    /// Overwrites the code word at byte offset `pos`, which must already
    /// have been written. The write pointer is unaffected.
    fn patch_word(&mut self, pos: usize, mut word: u32) {
        for i in 0..WORD_BYTES {
            self[pos + i] = word as u8;
            word >>= 8;
        }
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Tests of the [`Buffer`] API, for use by submodule tests.
    pub fn api(mut buffer: impl Buffer) {
        buffer.write_word(0xE1A00000);
        buffer.write_word(0x12345678);
        assert_eq!(buffer.get_pos(), 2 * WORD_BYTES);
        assert_eq!(buffer.read_word(0), 0xE1A00000);
        assert_eq!(buffer.read_word(WORD_BYTES), 0x12345678);
        buffer.patch_word(0, 0xEAFFFFFE);
        assert_eq!(buffer.read_word(0), 0xEAFFFFFE);
        assert_eq!(buffer.get_pos(), 2 * WORD_BYTES);
    }
}
