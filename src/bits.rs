//! Bit-field plumbing shared by every encoding in the catalog.
//!
//! Each operand owns a contiguous bit range of the raw 16- or 32-bit
//! instruction word. `Field` carries that range; `extract` and `inject`
//! are the matched accessor pair. Values are unsigned bit patterns at
//! this layer; sign interpretation belongs to the render and
//! control-flow hooks.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub lsb: u8,
    pub width: u8,
}

pub const fn field(lsb: u8, width: u8) -> Field {
    Field { lsb, width }
}

impl Field {
    pub const fn value_mask(self) -> u32 {
        (1u32 << self.width) - 1
    }

    pub const fn word_mask(self) -> u32 {
        self.value_mask() << self.lsb
    }

    /// Read the field out of a raw instruction word.
    pub const fn extract(self, word: u32) -> u32 {
        (word >> self.lsb) & self.value_mask()
    }

    /// Place a value into the field's bit range, leaving all other bits
    /// zero. Out-of-range values truncate to the field width.
    pub const fn inject(self, value: u32) -> u32 {
        (value & self.value_mask()) << self.lsb
    }

    /// Read the field and sign-extend from its top bit.
    pub fn extract_signed(self, word: u32) -> i32 {
        sign_ext(self.extract(word), self.width as u32)
    }
}

#[inline]
pub fn sign_ext(v: u32, bits: u32) -> i32 {
    let s = 32 - bits;
    ((v << s) as i32) >> s
}
