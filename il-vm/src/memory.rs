//! The memory access interface and a reference memory image.

use log::trace;

use crate::address::{self, Region, REGION_SIZE};

/// Memory access used by the interpreter.
///
/// The interpreter never stores memory itself; every load and store goes
/// through this trait. `invert` lets the implementation apply the inversion
/// appropriate to the cell type: logical for bits, bitwise for words.
pub trait Memory {
    /// Reads a cell. Invalid addresses read as 0. Bit cells read as 0 or 1.
    fn get(&self, address: u16, invert: bool) -> u16;

    /// Writes a cell. Writes to invalid addresses are ignored. Bit cells
    /// store `(value != 0) xor invert`.
    fn set(&mut self, address: u16, value: u16, invert: bool);
}

impl<M: Memory + ?Sized> Memory for &mut M {
    fn get(&self, address: u16, invert: bool) -> u16 {
        (**self).get(address, invert)
    }

    fn set(&mut self, address: u16, value: u16, invert: bool) {
        (**self).set(address, value, invert)
    }
}

/// Two bit banks and two word banks of [`REGION_SIZE`] cells each.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryImage {
    bits: [[bool; REGION_SIZE]; 2],
    words: [[u16; REGION_SIZE]; 2],
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every cell as `(address, value)` in address order.
    pub fn cells(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        Region::ALL.into_iter().flat_map(move |region| {
            (0..REGION_SIZE).filter_map(move |index| {
                let address = address::encode(region, index)?;
                Some((address, self.read(region, index)))
            })
        })
    }

    fn read(&self, region: Region, index: usize) -> u16 {
        match region {
            Region::BitBankA => self.bits[0][index] as u16,
            Region::BitBankB => self.bits[1][index] as u16,
            Region::WordBankA => self.words[0][index],
            Region::WordBankB => self.words[1][index],
        }
    }
}

impl Memory for MemoryImage {
    fn get(&self, address: u16, invert: bool) -> u16 {
        let Some((region, index)) = address::decode(address) else {
            trace!("Read from invalid address {address:05}");
            return 0;
        };
        let value = self.read(region, index);
        match (invert, region.is_bit()) {
            (false, _) => value,
            (true, true) => 1 - value,
            (true, false) => !value,
        }
    }

    fn set(&mut self, address: u16, value: u16, invert: bool) {
        let Some((region, index)) = address::decode(address) else {
            trace!("Write to invalid address {address:05} ignored");
            return;
        };
        let bit = (value != 0) ^ invert;
        let word = if invert { !value } else { value };
        match region {
            Region::BitBankA => self.bits[0][index] = bit,
            Region::BitBankB => self.bits[1][index] = bit,
            Region::WordBankA => self.words[0][index] = word,
            Region::WordBankB => self.words[1][index] = word,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_address() -> impl Strategy<Value = u16> {
        (prop::sample::select(vec![0u16, 1, 3, 4]), 1u16..=26)
            .prop_map(|(digit, slot)| digit * 10000 + slot)
    }

    #[test]
    fn get_when_invalid_address_then_zero() {
        let mem = MemoryImage::new();
        assert_eq!(mem.get(20001, false), 0);
        assert_eq!(mem.get(20001, true), 0);
        assert_eq!(mem.get(0, true), 0);
    }

    #[test]
    fn set_when_invalid_address_then_image_unchanged() {
        let mut mem = MemoryImage::new();
        mem.set(27, 1, false);
        mem.set(50001, 7, true);
        assert_eq!(mem, MemoryImage::new());
    }

    #[test]
    fn set_when_bit_and_nonzero_then_reads_one() {
        let mut mem = MemoryImage::new();
        mem.set(1, 500, false);
        assert_eq!(mem.get(1, false), 1);
    }

    #[test]
    fn set_when_bit_inverted_and_nonzero_then_clears() {
        let mut mem = MemoryImage::new();
        mem.set(10002, 1, false);
        mem.set(10002, 5, true);
        assert_eq!(mem.get(10002, false), 0);
    }

    #[test]
    fn set_when_word_inverted_then_stores_complement() {
        let mut mem = MemoryImage::new();
        mem.set(30004, 0x00F0, true);
        assert_eq!(mem.get(30004, false), 0xFF0F);
    }

    #[test]
    fn memory_when_used_through_mut_ref_then_writes_owner() {
        fn store<M: Memory>(mut mem: M) {
            mem.set(40001, 8, false);
        }
        let mut mem = MemoryImage::new();
        store(&mut mem);
        assert_eq!(mem.get(40001, false), 8);
    }

    #[test]
    fn cells_when_new_then_104_zero_cells_in_address_order() {
        let mem = MemoryImage::new();
        let cells: Vec<(u16, u16)> = mem.cells().collect();
        assert_eq!(cells.len(), 4 * REGION_SIZE);
        assert_eq!(cells[0], (1, 0));
        assert_eq!(cells[26], (10001, 0));
        assert_eq!(cells[52], (30001, 0));
        assert_eq!(cells[103], (40026, 0));
    }

    proptest! {
        #[test]
        fn get_after_set_returns_stored_representation(address in valid_address(), value in any::<u16>()) {
            let mut mem = MemoryImage::new();
            mem.set(address, value, false);

            let expected = if address / 10000 < 2 { (value != 0) as u16 } else { value };
            prop_assert_eq!(mem.get(address, false), expected);
        }

        #[test]
        fn inverted_get_after_set_returns_complement(address in valid_address(), value in any::<u16>()) {
            let mut mem = MemoryImage::new();
            mem.set(address, value, false);

            let expected = if address / 10000 < 2 { (value == 0) as u16 } else { !value };
            prop_assert_eq!(mem.get(address, true), expected);
        }
    }
}
