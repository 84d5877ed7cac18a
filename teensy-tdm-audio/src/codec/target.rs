//! Codec and channel selectors.
//!
//! Every facade operation takes one of each. Broadcasts walk codecs in
//! ascending index order so the mux tree is switched as little as possible.

use core::ops::Range;

/// Which codecs an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecSel {
    /// Every configured codec.
    All,
    One(u8),
}

impl CodecSel {
    /// Map a signed index, negative meaning all codecs.
    pub const fn from_index(index: i8) -> Self {
        if index < 0 {
            CodecSel::All
        } else {
            CodecSel::One(index as u8)
        }
    }

    /// Codec indices covered, given `codecs` configured.
    ///
    /// A single codec at or beyond the configured count covers nothing.
    pub fn range(self, codecs: u8) -> Range<u8> {
        match self {
            CodecSel::All => 0..codecs,
            CodecSel::One(codec) if codec < codecs => codec..codec + 1,
            CodecSel::One(_) => 0..0,
        }
    }

    /// The selected codec when it lies beyond the configured count.
    pub fn out_of_range(self, codecs: u8) -> Option<u8> {
        match self {
            CodecSel::One(codec) if codec >= codecs => Some(codec),
            _ => None,
        }
    }
}

impl From<u8> for CodecSel {
    fn from(codec: u8) -> Self {
        CodecSel::One(codec)
    }
}

/// Which channel of a codec an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSel {
    Left,
    Right,
    Both,
}

impl ChannelSel {
    /// Map the tri-state index: 0 left, 1 right, negative both.
    ///
    /// Indices above 1 are treated as both.
    pub const fn from_index(index: i8) -> Self {
        match index {
            0 => ChannelSel::Left,
            1 => ChannelSel::Right,
            _ => ChannelSel::Both,
        }
    }

    pub const fn left(self) -> bool {
        matches!(self, ChannelSel::Left | ChannelSel::Both)
    }

    pub const fn right(self) -> bool {
        matches!(self, ChannelSel::Right | ChannelSel::Both)
    }

    /// `left_bits` and/or `right_bits`, depending on the selection.
    pub const fn mask(self, left_bits: u8, right_bits: u8) -> u8 {
        let mut mask = 0;
        if self.left() {
            mask |= left_bits;
        }
        if self.right() {
            mask |= right_bits;
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_broadcast() {
        assert_eq!(CodecSel::from_index(-1), CodecSel::All);
        assert_eq!(CodecSel::from_index(3), CodecSel::One(3));
        assert_eq!(ChannelSel::from_index(-1), ChannelSel::Both);
        assert_eq!(ChannelSel::from_index(0), ChannelSel::Left);
        assert_eq!(ChannelSel::from_index(1), ChannelSel::Right);
    }

    #[test]
    fn ranges_ascend() {
        assert_eq!(CodecSel::All.range(4), 0..4);
        assert_eq!(CodecSel::One(2).range(4), 2..3);
    }

    #[test]
    fn single_codec_is_bounded_by_the_count() {
        assert!(CodecSel::One(4).range(4).is_empty());
        assert!(CodecSel::One(255).range(16).is_empty());
        assert_eq!(CodecSel::One(4).out_of_range(4), Some(4));
        assert_eq!(CodecSel::One(3).out_of_range(4), None);
        assert_eq!(CodecSel::All.out_of_range(4), None);
    }

    #[test]
    fn masks_follow_selection() {
        assert_eq!(ChannelSel::Left.mask(0x08, 0x02), 0x08);
        assert_eq!(ChannelSel::Right.mask(0x08, 0x02), 0x02);
        assert_eq!(ChannelSel::Both.mask(0x08, 0x02), 0x0A);
    }
}
