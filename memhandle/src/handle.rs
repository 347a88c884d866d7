use {
    crate::{DataType, Error, HandleKind, Result},
    std::ops::Range,
};

/// Whether an access reads from or writes to a payload.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessMode
{
    Read,
    Write,
}

/// A single memory block owned by a [handle table].
///
/// A handle is a small header followed by its payload,
/// a fixed-length byte buffer that only the handle owns.
/// Multi-byte values in the payload are stored big-endian.
///
/// Handles are reached through [`HandleTable::get`] and
/// [`HandleTable::get_mut`]; they cannot be created or freed directly.
///
/// [handle table]: `crate::HandleTable`
/// [`HandleTable::get`]: `crate::HandleTable::get`
/// [`HandleTable::get_mut`]: `crate::HandleTable::get_mut`
pub struct Handle
{
    /// Identifier; the bits under `slot_mask` are the owning slot.
    id: u32,

    /// Capacity of the table minus one, at the time of creation.
    slot_mask: u32,

    kind: HandleKind,

    /// Bookkeeping for the collector; initially one.
    ref_count: i32,

    /// Distinguishes this handle from any other handle of its table,
    /// including handles that reused its slot and identifier.
    serial: u64,

    payload: Box<[u8]>,
}

impl Handle
{
    /// Create a handle with a zeroed payload of `size` bytes.
    pub (crate) fn new(
        id: u32,
        slot_mask: u32,
        kind: HandleKind,
        serial: u64,
        size: usize,
    ) -> Result<Self>
    {
        // Reserve first so that failure is reported instead of aborting.
        let mut payload = Vec::new();
        payload.try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory(size))?;
        payload.resize(size, 0);

        Ok(Self{
            id,
            slot_mask,
            kind,
            ref_count: 1,
            serial,
            payload: payload.into_boxed_slice(),
        })
    }

    /// The identifier of the handle.
    pub fn id(&self) -> u32
    {
        self.id
    }

    /// The slot mask recorded when the handle was created.
    ///
    /// This is not updated when the table grows.
    pub fn slot_mask(&self) -> u32
    {
        self.slot_mask
    }

    /// The slot the handle was placed in.
    pub fn slot(&self) -> usize
    {
        (self.id & self.slot_mask) as usize
    }

    pub (crate) fn serial(&self) -> u64
    {
        self.serial
    }

    /// What the payload represents.
    pub fn kind(&self) -> HandleKind
    {
        self.kind
    }

    /// The number of bytes in the payload.
    pub fn len(&self) -> i32
    {
        // Payloads are created from non-negative i32 sizes.
        self.payload.len() as i32
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool
    {
        self.payload.is_empty()
    }

    /// The reference count.
    pub fn ref_count(&self) -> i32
    {
        self.ref_count
    }

    /// Overwrite the reference count.
    ///
    /// When and how the count changes is up to the collector;
    /// handles are not deleted when it reaches zero.
    pub fn set_ref_count(&mut self, ref_count: i32)
    {
        self.ref_count = ref_count;
    }

    /// The entire payload.
    pub fn bytes(&self) -> &[u8]
    {
        &self.payload
    }

    /// The entire payload, mutably.
    pub fn bytes_mut(&mut self) -> &mut [u8]
    {
        &mut self.payload
    }

    /// Zero the payload and reset the header.
    ///
    /// Called before the handle is freed,
    /// so that its contents do not leak into later allocations.
    pub (crate) fn wipe(&mut self)
    {
        self.payload.fill(0);
        self.id = 0;
        self.slot_mask = 0;
        self.kind = HandleKind::Undefined;
        self.ref_count = 0;
        self.serial = 0;
    }
}

/* -------------------------------------------------------------------------- */
/*                               Bounds checking                              */
/* -------------------------------------------------------------------------- */

impl Handle
{
    /// Check that `length` bytes starting at `offset` lie within the payload.
    pub fn in_bounds(&self, offset: i32, length: i32) -> Result<()>
    {
        self.range(offset, length).map(|_| ())
    }

    /// Like [`in_bounds`][`Self::in_bounds`], but return the byte range.
    fn range(&self, offset: i32, length: i32) -> Result<Range<usize>>
    {
        // Computed in i64 so that offset + length cannot overflow.
        let end = offset as i64 + length as i64;
        if offset < 0 || length < 0 || end > self.len() as i64 {
            return Err(Error::OutOfBounds{offset, length});
        }
        Ok(offset as usize .. end as usize)
    }

    /// Copy bytes from the payload into `buf`.
    pub fn read_bytes(&self, offset: i32, buf: &mut [u8]) -> Result<()>
    {
        let range = self.range(offset, slice_len(buf.len(), offset)?)?;
        buf.copy_from_slice(&self.payload[range]);
        Ok(())
    }

    /// Copy `buf` into the payload.
    pub fn write_bytes(&mut self, offset: i32, buf: &[u8]) -> Result<()>
    {
        let range = self.range(offset, slice_len(buf.len(), offset)?)?;
        self.payload[range].copy_from_slice(buf);
        Ok(())
    }
}

/// A buffer longer than any payload can never be in bounds.
fn slice_len(len: usize, offset: i32) -> Result<i32>
{
    i32::try_from(len)
        .map_err(|_| Error::OutOfBounds{offset, length: i32::MAX})
}

/* -------------------------------------------------------------------------- */
/*                                Typed access                                */
/* -------------------------------------------------------------------------- */

impl Handle
{
    /// Read or write a value of a narrow data type at `offset`.
    ///
    /// When reading, the decoded value is stored in `value`.
    /// When writing, `value` is encoded into the payload;
    /// types narrower than `i32` keep only the low bits.
    /// Wide data types are rejected with [`Error::WrongWidth`].
    pub fn access(
        &mut self,
        mode: AccessMode,
        data_type: DataType,
        value: &mut i32,
        offset: i32,
    ) -> Result<()>
    {
        match mode {
            AccessMode::Read  => *value = self.read(data_type, offset)?,
            AccessMode::Write => self.write(data_type, offset, *value)?,
        }
        Ok(())
    }

    /// Read or write a value of a wide data type at `offset`.
    ///
    /// See [`access`][`Self::access`].
    /// Narrow data types are rejected with [`Error::WrongWidth`].
    pub fn access_wide(
        &mut self,
        mode: AccessMode,
        data_type: DataType,
        value: &mut i64,
        offset: i32,
    ) -> Result<()>
    {
        match mode {
            AccessMode::Read  => *value = self.read_wide(data_type, offset)?,
            AccessMode::Write => self.write_wide(data_type, offset, *value)?,
        }
        Ok(())
    }

    /// Decode a value of a narrow data type at `offset`.
    ///
    /// Bytes and shorts are sign-extended, characters are zero-extended.
    pub fn read(&self, data_type: DataType, offset: i32) -> Result<i32>
    {
        let value = match data_type {
            DataType::Byte =>
                i8::from_be_bytes(self.read_array(offset)?) as i32,
            DataType::Short =>
                i16::from_be_bytes(self.read_array(offset)?) as i32,
            DataType::Character =>
                u16::from_be_bytes(self.read_array(offset)?) as i32,
            DataType::Integer | DataType::Float =>
                i32::from_be_bytes(self.read_array(offset)?),
            DataType::Long | DataType::Double =>
                return Err(Error::WrongWidth(data_type)),
        };
        Ok(value)
    }

    /// Encode a value of a narrow data type at `offset`.
    pub fn write(&mut self, data_type: DataType, offset: i32, value: i32)
        -> Result<()>
    {
        match data_type {
            DataType::Byte =>
                self.write_bytes(offset, &(value as i8).to_be_bytes()),
            DataType::Short | DataType::Character =>
                self.write_bytes(offset, &(value as u16).to_be_bytes()),
            DataType::Integer | DataType::Float =>
                self.write_bytes(offset, &value.to_be_bytes()),
            DataType::Long | DataType::Double =>
                Err(Error::WrongWidth(data_type)),
        }
    }

    /// Decode a value of a wide data type at `offset`.
    pub fn read_wide(&self, data_type: DataType, offset: i32) -> Result<i64>
    {
        match data_type {
            DataType::Long | DataType::Double =>
                Ok(i64::from_be_bytes(self.read_array(offset)?)),
            _ => Err(Error::WrongWidth(data_type)),
        }
    }

    /// Encode a value of a wide data type at `offset`.
    pub fn write_wide(&mut self, data_type: DataType, offset: i32, value: i64)
        -> Result<()>
    {
        match data_type {
            DataType::Long | DataType::Double =>
                self.write_bytes(offset, &value.to_be_bytes()),
            _ => Err(Error::WrongWidth(data_type)),
        }
    }

    fn read_array<const N: usize>(&self, offset: i32) -> Result<[u8; N]>
    {
        let mut array = [0; N];
        self.read_bytes(offset, &mut array)?;
        Ok(array)
    }
}
