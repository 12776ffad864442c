use std::ops::{BitOr, BitOrAssign};

/// Per-pixel flag bitset used by one extraction pass. Created per pass,
/// mutated in place, discarded once the pass's polygons exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelFlags(u8);

impl PixelFlags {
    pub const EMPTY: PixelFlags = PixelFlags(0);
    /// Actually opaque pixels (alpha != 0).
    pub const SOLID: PixelFlags = PixelFlags(0x01);
    /// Near-solid pixels added by dilation or hole closing.
    pub const DILATED: PixelFlags = PixelFlags(0x02);
    /// After dilating, the rim towards the outside.
    pub const BOUNDARY: PixelFlags = PixelFlags(0x04);
    /// Polygon edges may only pass through pixels with this bit.
    pub const BAND: PixelFlags = PixelFlags(0x08);
    /// Definitely not an enclosed hole (reachable from the image border).
    pub const NO_HOLE: PixelFlags = PixelFlags(0x10);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// True if any bit of `other` is set in `self`.
    pub fn intersects(self, other: PixelFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: PixelFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for PixelFlags {
    type Output = PixelFlags;

    fn bitor(self, rhs: PixelFlags) -> PixelFlags {
        PixelFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PixelFlags {
    fn bitor_assign(&mut self, rhs: PixelFlags) {
        self.0 |= rhs.0;
    }
}
