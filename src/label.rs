/// How the code word at a patch site encodes its target, once known.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PatchKind {
    /// A `B`, `BL` or conditional branch: a signed 24-bit word displacement,
    /// measured from the site plus the 8-byte A32 read-ahead.
    Branch24,
    /// A bare data word holding a code-area byte offset.
    Word32,
}

/// Represents the address of a code word that encodes a jump to a `Label`,
/// or a table word that holds a `Label`'s address.
#[derive(Debug, Copy, Clone)]
pub struct Patch {
    kind: PatchKind,
    at: usize,
}

impl Patch {
    /// The address is expressed as a byte offset into the emitted code.
    pub fn new(kind: PatchKind, at: usize) -> Self { Patch {kind, at} }

    pub fn address(&self) -> usize { self.at }

    pub fn kind(&self) -> PatchKind { self.kind }
}

//-----------------------------------------------------------------------------

/// Represents a possibly unknown control-flow target, and accumulates the
/// set of code words that refer to it. An undefined `Label` is resolved
/// using [`Assembler::define()`], which fixes up the accumulated [`Patch`]es.
///
/// [`Assembler::define()`]: super::Assembler::define
#[derive(Debug)]
pub struct Label {
    target: Option<usize>,
    patches: Vec<Patch>,
}

impl Label {
    /// Constructs an unused `Label` with an unknown target address.
    pub fn new() -> Self {
        Label {target: None, patches: Vec::new()}
    }

    /// Returns the low-level target address of this `Label`, if known. The
    /// address is expressed as a byte offset into the emitted code.
    pub fn target(&self) -> Option<usize> { self.target }

    /// Tests whether `self` has a known target address.
    pub fn is_defined(&self) -> bool {
        self.target().is_some()
    }

    /// Appends `patch` to the list of code words that refer to `self`.
    pub fn push(&mut self, patch: Patch) {
        self.patches.push(patch);
    }

    /// Returns and forgets all the code words that refer to `self`.
    pub fn drain(&mut self) -> impl Iterator<Item=Patch> + '_ {
        self.patches.drain(..)
    }
}

impl Default for Label {
    fn default() -> Self { Label::new() }
}

/// Define `label`, which must not previously have been defined.
pub fn define(label: &mut Label, target: usize) {
    assert!(!label.is_defined());
    label.target = Some(target);
}
