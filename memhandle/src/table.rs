use {
    crate::{
        Error,
        Handle,
        HandleKind,
        IdSource,
        Result,
        TableConfig,
    },
    log::{debug, trace, warn},
    rand::RngCore,
    std::{
        mem::size_of,
        sync::atomic::{AtomicU64, Ordering::Relaxed},
    },
};

/// Source of table serials, so that handles of different tables differ.
static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

/// Reference to a handle, as given out by a [`HandleTable`].
///
/// References are plain values; holding one does not keep the handle alive.
/// The table checks every reference it is presented with,
/// so references to deleted handles or to handles of other tables
/// are rejected with [`Error::InvalidHandle`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HandleRef
{
    table: u64,
    serial: u64,
    id: u32,
    slot_mask: u32,
}

impl HandleRef
{
    /// The identifier of the handle.
    pub fn id(self) -> u32
    {
        self.id
    }

    /// The slot mask recorded when the handle was created.
    pub fn slot_mask(self) -> u32
    {
        self.slot_mask
    }

    /// The slot the handle was placed in.
    pub fn slot(self) -> usize
    {
        (self.id & self.slot_mask) as usize
    }
}

/// Table of all handles of a virtual machine.
///
/// Handles live in slots, of which there is always a power-of-two number.
/// Handles are placed in a random free slot where possible,
/// and the table doubles in size when all slots are occupied.
/// Each handle receives a random identifier, unique within the table,
/// whose low bits are the index of its slot.
///
/// The table is meant to be used by one interpreter thread at a time.
pub struct HandleTable
{
    table_id: u64,

    /// Occupied slots hold a handle whose slot is the index.
    slots: Vec<Option<Box<Handle>>>,

    max_capacity: usize,

    random: IdSource,

    /// Serial for the next handle; serials are never reused.
    next_serial: u64,

    /// The number of occupied slots.
    live: usize,
}

/* -------------------------------------------------------------------------- */
/*                          Creating and destroying                           */
/* -------------------------------------------------------------------------- */

impl HandleTable
{
    /// Create an empty table with the default configuration.
    ///
    /// The identifier generator is seeded from the operating system.
    pub fn create() -> Result<Self>
    {
        Self::with_config(&TableConfig::default())
    }

    /// Create an empty table with the given configuration.
    pub fn with_config(config: &TableConfig) -> Result<Self>
    {
        config.validate()?;
        let random = match config.seed {
            Some(seed) => IdSource::from_seed(seed),
            None => IdSource::from_entropy()?,
        };
        debug!(
            "Creating handle table with {} slots ({} seed)",
            config.initial_capacity,
            if config.seed.is_some() { "fixed" } else { "entropy" },
        );
        Self::with_source(random, config)
    }

    /// Create an empty table that draws identifiers from `rng`.
    ///
    /// The seed in the configuration is ignored.
    pub fn with_rng(rng: Box<dyn RngCore + Send>, config: &TableConfig)
        -> Result<Self>
    {
        config.validate()?;
        Self::with_source(IdSource::from_rng(rng), config)
    }

    fn with_source(random: IdSource, config: &TableConfig) -> Result<Self>
    {
        let capacity = config.initial_capacity;

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)
            .map_err(|_| Error::OutOfMemory(slots_size(capacity)))?;
        slots.resize_with(capacity, || None);

        Ok(Self{
            table_id: NEXT_TABLE_ID.fetch_add(1, Relaxed),
            slots,
            max_capacity: config.max_capacity,
            random,
            next_serial: 0,
            live: 0,
        })
    }

    /// Delete every handle and release the table.
    ///
    /// Handles are deleted in slot order, exactly as by [`delete`].
    /// If a handle cannot be deleted, destruction stops at that slot
    /// and [`Error::DestroyFailed`] is returned.
    /// The handles in the remaining slots are then released without checks.
    ///
    /// [`delete`]: `Self::delete`
    pub fn destroy(mut self) -> Result<()>
    {
        debug!(
            "Destroying handle table with {} live handles in {} slots",
            self.live,
            self.capacity(),
        );

        for slot in 0 .. self.slots.len() {
            let Some(handle) = &self.slots[slot] else { continue };
            let handle = self.handle_ref(handle);
            if let Err(source) = self.delete(handle) {
                warn!("Destroying handle table stopped at slot {slot}");
                return Err(Error::DestroyFailed{slot, source: Box::new(source)});
            }
        }

        Ok(())
    }
}

impl Drop for HandleTable
{
    fn drop(&mut self)
    {
        for handle in self.slots.iter_mut().flatten() {
            handle.wipe();
        }
    }
}

/// The number of bytes taken up by a slot array.
fn slots_size(capacity: usize) -> usize
{
    capacity.saturating_mul(size_of::<Option<Box<Handle>>>())
}

/* -------------------------------------------------------------------------- */
/*                       Creating and deleting handles                        */
/* -------------------------------------------------------------------------- */

impl HandleTable
{
    /// Create a handle with a zeroed payload of `size` bytes.
    ///
    /// The handle starts with a reference count of one.
    pub fn new_handle(&mut self, kind: HandleKind, size: i32)
        -> Result<HandleRef>
    {
        if size < 0 {
            return Err(Error::NegativeSize(size));
        }

        if !kind.is_valid() {
            return Err(Error::InvalidKind(kind.code()));
        }

        let (slot, draw) = self.choose_slot()?;
        let id = self.mint_id(slot, draw)?;
        let slot_mask = self.slot_mask();

        // Nothing is stored until the payload is allocated,
        // so a failed allocation leaves the slot empty.
        let serial = self.next_serial;
        let handle = Handle::new(id, slot_mask, kind, serial, size as usize)?;
        self.next_serial += 1;

        trace!(
            "New handle {:#010x} in slot {} ({:?}, {} bytes)",
            id, slot, kind, size,
        );

        let handle_ref = self.handle_ref(&handle);
        self.slots[slot] = Some(Box::new(handle));
        self.live += 1;
        Ok(handle_ref)
    }

    /// Delete a handle, freeing its payload.
    ///
    /// The payload is zeroed before it is freed.
    /// If the handle does not belong to this table,
    /// nothing happens and [`Error::InvalidHandle`] is returned.
    pub fn delete(&mut self, handle: HandleRef) -> Result<()>
    {
        let slot = self.locate(handle)?;
        let Some(mut handle) = self.slots[slot].take()
            else { return Err(Error::InvalidHandle(handle.id)) };
        self.live -= 1;

        trace!("Delete handle {:#010x} in slot {}", handle.id(), slot);

        handle.wipe();
        Ok(())
    }

    /// Pick a slot for a new handle, growing the table if it is full.
    ///
    /// Returns the slot together with the random value drawn for it.
    fn choose_slot(&mut self) -> Result<(usize, u32)>
    {
        loop {
            let draw = self.random.next_u32(self.capacity() as i64)?;

            // Prefer the slot that the random value points at.
            let slot = (draw & self.slot_mask()) as usize;
            if self.slots[slot].is_none() {
                return Ok((slot, draw));
            }

            // Otherwise take the first free slot.
            if let Some(slot) = self.slots.iter().position(Option::is_none) {
                return Ok((slot, draw));
            }

            // The table is full. Grow it and draw again,
            // so that placement stays random in the larger table.
            self.grow()?;
        }
    }

    /// Double the number of slots.
    fn grow(&mut self) -> Result<()>
    {
        let capacity = self.capacity();
        let new_capacity = capacity * 2;
        if new_capacity > self.max_capacity {
            return Err(Error::OutOfMemory(slots_size(new_capacity)));
        }

        self.slots.try_reserve_exact(new_capacity - capacity)
            .map_err(|_| Error::OutOfMemory(slots_size(new_capacity)))?;
        self.slots.resize_with(new_capacity, || None);

        debug!("Grew handle table from {} to {} slots", capacity, new_capacity);
        Ok(())
    }

    /// Find an identifier for a handle in `slot` that no handle has yet.
    ///
    /// The random bits above the slot mask come from `draw` at first,
    /// and from fresh random values after each collision.
    fn mint_id(&mut self, slot: usize, mut draw: u32) -> Result<u32>
    {
        let slot_mask = self.slot_mask();
        loop {
            let id = (draw & !slot_mask) | slot as u32;

            // Handles created before the table grew have fewer slot bits,
            // so their identifiers may still coincide with this one.
            let taken = self.slots.iter().flatten().any(|h| h.id() == id);
            if !taken {
                return Ok(id);
            }

            debug!("Identifier {:#010x} is taken; drawing another", id);
            draw = self.random.next_u32(id as i64)?;
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Lookup                                   */
/* -------------------------------------------------------------------------- */

impl HandleTable
{
    /// The handle that `handle` refers to.
    pub fn get(&self, handle: HandleRef) -> Result<&Handle>
    {
        let slot = self.locate(handle)?;
        self.slots[slot].as_deref()
            .ok_or(Error::InvalidHandle(handle.id))
    }

    /// The handle that `handle` refers to, mutably.
    pub fn get_mut(&mut self, handle: HandleRef) -> Result<&mut Handle>
    {
        let slot = self.locate(handle)?;
        self.slots[slot].as_deref_mut()
            .ok_or(Error::InvalidHandle(handle.id))
    }

    /// Whether `handle` refers to a live handle of this table.
    pub fn contains(&self, handle: HandleRef) -> bool
    {
        self.locate(handle).is_ok()
    }

    /// The number of live handles.
    pub fn len(&self) -> usize
    {
        self.live
    }

    /// Whether there are no live handles.
    pub fn is_empty(&self) -> bool
    {
        self.live == 0
    }

    /// The number of slots.
    pub fn capacity(&self) -> usize
    {
        self.slots.len()
    }

    /// Iterate over the live handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (HandleRef, &Handle)>
    {
        self.slots.iter()
            .flatten()
            .map(move |handle| (self.handle_ref(handle), &**handle))
    }

    /// Find the slot of the handle that `handle` refers to.
    ///
    /// The slot must hold the very handle that the reference was made for;
    /// a different handle that reused the slot and identifier is rejected.
    fn locate(&self, handle: HandleRef) -> Result<usize>
    {
        let slot = handle.slot();
        match self.slots.get(slot) {
            Some(Some(occupant))
                if handle.table == self.table_id
                && occupant.id() == handle.id
                && occupant.serial() == handle.serial
                => Ok(slot),
            _ => Err(Error::InvalidHandle(handle.id)),
        }
    }

    fn handle_ref(&self, handle: &Handle) -> HandleRef
    {
        HandleRef{
            table: self.table_id,
            serial: handle.serial(),
            id: handle.id(),
            slot_mask: handle.slot_mask(),
        }
    }

    fn slot_mask(&self) -> u32
    {
        // Capacities never exceed CAPACITY_LIMIT.
        (self.capacity() - 1) as u32
    }
}
