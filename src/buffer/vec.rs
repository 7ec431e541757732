use std::ops::{Deref, DerefMut};
use super::{Buffer};

/// A growable [`Buffer`] backed by an ordinary `Vec<u8>`. Suitable for
/// ahead-of-time emission and for tests; the contents can be copied
/// elsewhere to be executed.
#[allow(clippy::module_name_repetitions)]
pub struct VecU8 {
    buffer: Vec<u8>,
    pos: usize,
}

impl VecU8 {
    pub fn new() -> Self {
        VecU8 {buffer: Vec::new(), pos: 0}
    }
}

impl Default for VecU8 {
    fn default() -> Self { VecU8::new() }
}

impl Deref for VecU8 {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &*self.buffer
    }
}

impl DerefMut for VecU8 {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Buffer for VecU8 {
    fn get_pos(&self) -> usize { self.pos }
    fn set_pos(&mut self, pos: usize) { self.pos = pos; }

    /// Like the default implementation, but grows the backing `Vec` when
    /// the write pointer reaches the end of it.
    fn write_byte(&mut self, byte: u8) {
        if self.pos == self.buffer.len() {
            self.buffer.push(byte);
        } else {
            self.buffer[self.pos] = byte;
        }
        self.pos += 1;
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api() {
        super::super::tests::api(VecU8::new())
    }
}
