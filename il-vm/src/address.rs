//! Decodes five-digit memory addresses into a region and a cell index.
//!
//! The ten-thousands digit selects the region and the remaining four
//! digits select a 1-indexed slot within that region, so `40001` is the
//! first cell of word bank B and `00026` is the last cell of bit bank A.

/// Number of cells in each memory region.
pub const REGION_SIZE: usize = 26;

const REGION_DIVISOR: u16 = 10000;

/// One of the four addressable memory spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    BitBankA,
    BitBankB,
    WordBankA,
    WordBankB,
}

impl Region {
    /// All regions in address order.
    pub const ALL: [Region; 4] = [
        Region::BitBankA,
        Region::BitBankB,
        Region::WordBankA,
        Region::WordBankB,
    ];

    fn from_digit(digit: u16) -> Option<Self> {
        match digit {
            0 => Some(Region::BitBankA),
            1 => Some(Region::BitBankB),
            3 => Some(Region::WordBankA),
            4 => Some(Region::WordBankB),
            _ => None,
        }
    }

    /// Returns the ten-thousands digit that selects this region.
    pub fn digit(&self) -> u16 {
        match self {
            Region::BitBankA => 0,
            Region::BitBankB => 1,
            Region::WordBankA => 3,
            Region::WordBankB => 4,
        }
    }

    /// Returns true if cells in this region hold a single bit.
    pub fn is_bit(&self) -> bool {
        matches!(self, Region::BitBankA | Region::BitBankB)
    }
}

/// Maps an address to its region and 0-based cell index.
///
/// Returns `None` when the slot is outside `1..=26` or the region digit
/// is not one of 0, 1, 3 or 4.
pub fn decode(address: u16) -> Option<(Region, usize)> {
    let slot = (address % REGION_DIVISOR) as usize;
    if slot == 0 || slot > REGION_SIZE {
        return None;
    }
    let region = Region::from_digit(address / REGION_DIVISOR)?;
    Some((region, slot - 1))
}

/// Builds the address of a cell. This is the inverse of [`decode`].
pub fn encode(region: Region, index: usize) -> Option<u16> {
    if index >= REGION_SIZE {
        return None;
    }
    Some(region.digit() * REGION_DIVISOR + index as u16 + 1)
}
