//! NDR alignment model
//!
//! Every NDR primitive is aligned to its own size, and a constructed type is
//! aligned to its most strictly aligned member. Padding is always zero bytes
//! on write and skipped uninspected on read.

/// Alignment boundary of a wire type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Alignment {
    /// Byte arrays, `small`, `boolean`, context handles
    One,
    /// `short`, `wchar_t`
    Two,
    /// `long`, referents, conformance and variance headers
    Four,
}

impl Alignment {
    /// Boundary in bytes
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }

    /// Number of padding bytes needed at `position` to reach this boundary
    #[inline]
    pub const fn pad_to(self, position: usize) -> usize {
        let align = self.bytes();
        (align - position % align) % align
    }

    /// The stricter of two alignments
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::One
    }
}
