//! Sharing one register map between the MFD's child drivers.

use alloc::rc::Rc;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, rwlock::RwLock};

use crate::regmap::RegisterMap;

/// `RwLock`-based shared [`RegisterMap`].
///
/// The keyboard, backlight and battery drivers all talk to the same
/// register file. Each driver holds its own `SharedRegisterMap`; every
/// register operation takes the lock for the duration of the transfer, so
/// the siblings are serialized here rather than in each driver. A caller
/// may observe added latency while another driver holds the bus; that is
/// not an error.
pub struct SharedRegisterMap<M: RegisterMap> {
    map: Rc<RwLock<CriticalSectionRawMutex, M>>,
}

impl<M: RegisterMap> SharedRegisterMap<M> {
    /// Creates a new `SharedRegisterMap` handle.
    ///
    /// Clone the `Rc` once per sibling driver.
    pub fn new(map: Rc<RwLock<CriticalSectionRawMutex, M>>) -> Self {
        Self { map }
    }
}

impl<M: RegisterMap> RegisterMap for SharedRegisterMap<M> {
    type Error = M::Error;

    async fn read_u8(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut map = self.map.write().await;
        map.read_u8(reg).await
    }

    async fn read_pair(&mut self, reg: u8) -> Result<[u8; 2], Self::Error> {
        let mut map = self.map.write().await;
        map.read_pair(reg).await
    }

    async fn write_u8(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        let mut map = self.map.write().await;
        map.write_u8(reg, value).await
    }
}
