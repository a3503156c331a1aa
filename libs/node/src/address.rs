//! The node's bus address and its non-volatile backing byte.

use crate::hal::{BusTransceiver, NonVolatile};

/// Default reserved offset of the address byte in non-volatile storage.
pub const EEPROM_ADDRESS_OFFSET: u16 = 0x0000;

/// Reported while no address has been bound yet.
pub const BROADCAST_ADDRESS: u8 = 0x00;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressState {
    Unbound,
    Bound(u8),
}

/// Owns the cached bus address.
///
/// The cache is authoritative once bound. The persisted byte may lag it when
/// a write fails; the mismatch resolves on the next successful
/// [`AddressStore::set_address`] or at the next [`AddressStore::begin`].
#[derive(Clone, Copy, Debug)]
pub struct AddressStore {
    offset: u16,
    state: AddressState,
}

impl AddressStore {
    pub const fn new(offset: u16) -> Self {
        Self {
            offset,
            state: AddressState::Unbound,
        }
    }

    pub const fn offset(&self) -> u16 {
        self.offset
    }

    pub const fn state(&self) -> AddressState {
        self.state
    }

    /// Current address, or [`BROADCAST_ADDRESS`] while unbound.
    pub const fn get_address(&self) -> u8 {
        match self.state {
            AddressState::Bound(address) => address,
            AddressState::Unbound => BROADCAST_ADDRESS,
        }
    }

    /// Load the persisted address and join the bus with it.
    ///
    /// Whatever byte is stored is used verbatim; no reserved-range check.
    pub fn begin<S>(&mut self, board: &mut S) -> u8
    where
        S: NonVolatile + BusTransceiver + ?Sized,
    {
        let mut raw = [BROADCAST_ADDRESS];
        if board.read_block(self.offset, &mut raw).is_err() {
            warn!("address byte unreadable at {=u16:#x}", self.offset);
            raw[0] = BROADCAST_ADDRESS;
        }

        let address = raw[0];
        self.state = AddressState::Bound(address);
        board.begin(address);
        info!("bus address {=u8:#x}", address);
        address
    }

    /// Rebind to `address` and persist it.
    ///
    /// Order: cache, bus, then storage. A failed storage write leaves the node
    /// answering at `address` for this session only.
    pub fn set_address<S>(&mut self, board: &mut S, address: u8) -> u8
    where
        S: NonVolatile + BusTransceiver + ?Sized,
    {
        let previous = self.get_address();
        self.state = AddressState::Bound(address);
        board.begin(address);

        if board.write_block(self.offset, &[address]).is_err() {
            warn!(
                "address {=u8:#x} not persisted; storage keeps the old value",
                address
            );
        }
        info!("bus address {=u8:#x} -> {=u8:#x}", previous, address);
        address
    }

    /// Whether `len` bytes starting at `start` include the reserved byte.
    pub fn overlaps(&self, start: u16, len: usize) -> bool {
        let start = start as usize;
        let reserved = self.offset as usize;
        len > 0 && start <= reserved && reserved - start < len
    }
}
