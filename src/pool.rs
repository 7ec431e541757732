use indexmap::{IndexMap};

use super::buffer::{WORD_BYTES};

/// A constant value awaiting a literal pool slot. Doubles are keyed by bit
/// pattern, so distinct NaN payloads (and `0.0` vs `-0.0`) get distinct
/// entries, exactly as the loads that want them require.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Lit {
    /// A 32-bit integer or address constant: one pool slot, loaded with
    /// `LDR`.
    Word(u32),
    /// A double-precision constant: two pool slots, loaded with `VLDR`,
    /// which has the strict pc-relative range.
    Double(u64),
}

impl Lit {
    /// The number of code words this entry occupies in the pool.
    pub fn slots(self) -> usize {
        match self {
            Lit::Word(_) => 1,
            Lit::Double(_) => 2,
        }
    }

    /// Whether loads of this entry use the strict (floating-point)
    /// addressing range.
    pub fn is_float(self) -> bool {
        matches!(self, Lit::Double(_))
    }

    /// The number of bytes this entry occupies in the pool.
    pub fn size(self) -> usize { self.slots() * WORD_BYTES }
}

//-----------------------------------------------------------------------------

/// The pending literal pool for one function body: an insertion-ordered
/// collection of constants, each with the set of already-emitted load sites
/// awaiting it. Entries are appended as a side effect of emitting `Const`
/// and `ConstF` operands, and are all removed, atomically, when the
/// [`Emitter`] flushes the pool.
///
/// Between flushes the pool only grows.
///
/// [`Emitter`]: super::Emitter
#[derive(Debug, Default)]
pub struct LitPool {
    /// Pending entries, in first-reference order. The value is the list of
    /// load sites (byte offsets) to patch when the entry is placed.
    entries: IndexMap<Lit, Vec<usize>>,
    /// Total slots occupied by pending entries.
    slots: usize,
    /// The number of pending entries with the strict addressing range.
    floats: usize,
}

impl LitPool {
    pub fn new() -> Self {
        LitPool::default()
    }

    /// Records that the load emitted at `at` awaits `lit`. Equal values
    /// share one entry; both sites get patched to the same pool word.
    pub fn intern(&mut self, lit: Lit, at: usize) {
        let sites = self.entries.entry(lit).or_insert_with(|| {
            self.slots += lit.slots();
            if lit.is_float() {
                self.floats += 1;
            }
            Vec::new()
        });
        sites.push(at);
    }

    /// The number of distinct pending entries.
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The total number of pool slots the pending entries will occupy.
    /// Entries placed late in the pool sit this much further from the loads
    /// that await them, so the [`Emitter`] subtracts this from its range
    /// base.
    ///
    /// [`Emitter`]: super::Emitter
    pub fn pending_slots(&self) -> usize { self.slots }

    /// Whether any pending entry must be loaded with the strict range.
    pub fn has_float(&self) -> bool { self.floats > 0 }

    /// Removes and returns all pending entries, in first-reference order.
    pub fn take(&mut self) -> IndexMap<Lit, Vec<usize>> {
        self.slots = 0;
        self.floats = 0;
        std::mem::take(&mut self.entries)
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedups() {
        let mut pool = LitPool::new();
        pool.intern(Lit::Word(0x12345678), 0);
        pool.intern(Lit::Word(0x12345678), 12);
        pool.intern(Lit::Word(0x9ABCDEF0), 24);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.pending_slots(), 2);
        assert!(!pool.has_float());
        let entries = pool.take();
        assert!(pool.is_empty());
        assert_eq!(pool.pending_slots(), 0);
        let sites: Vec<_> = entries.into_iter().collect();
        assert_eq!(sites[0], (Lit::Word(0x12345678), vec![0, 12]));
        assert_eq!(sites[1], (Lit::Word(0x9ABCDEF0), vec![24]));
    }

    #[test]
    fn floats_are_wider() {
        let mut pool = LitPool::new();
        pool.intern(Lit::Word(123), 0);
        assert!(!pool.has_float());
        pool.intern(Lit::Double(2.5f64.to_bits()), 4);
        assert!(pool.has_float());
        assert_eq!(pool.pending_slots(), 3);
        // `0.0` and `-0.0` have different bit patterns.
        pool.intern(Lit::Double(0.0f64.to_bits()), 8);
        pool.intern(Lit::Double((-0.0f64).to_bits()), 12);
        assert_eq!(pool.len(), 4);
        pool.take();
        assert!(!pool.has_float());
    }
}
