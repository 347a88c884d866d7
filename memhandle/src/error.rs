use {crate::DataType, thiserror::Error};

/// Result of handle operations.
pub type Result<T> =
    std::result::Result<T, Error>;

/// Error returned by handle table and handle operations.
///
/// The virtual machine reports errors as a code plus a numeric context.
/// Use [`code`][`Self::code`] and [`context`][`Self::context`]
/// to obtain that representation.
#[derive(Debug, Error)]
pub enum Error
{
    /// An allocation of the given number of bytes failed.
    #[error("Out of memory allocating {0} bytes")]
    OutOfMemory(usize),

    /// A handle was requested with a negative size.
    #[error("Negative handle size: {0}")]
    NegativeSize(i32),

    /// A handle kind code is a sentinel or out of range.
    #[error("Invalid handle kind: {0}")]
    InvalidKind(i32),

    /// The identifier generator could not be seeded or drawn from.
    #[error("Could not seed the identifier generator")]
    SeedFailure
    {
        /// Value being computed when the generator failed.
        context: i64,
        #[source]
        source: rand::Error,
    },

    /// An access fell outside of the payload of a handle.
    #[error("Access of {length} bytes at offset {offset} is out of bounds")]
    OutOfBounds
    {
        #[allow(missing_docs)]
        offset: i32,
        #[allow(missing_docs)]
        length: i32,
    },

    /// The handle is not owned by the table it was presented to.
    #[error("Invalid handle: {0:#010x}")]
    InvalidHandle(u32),

    /// Destroying a table stopped at a slot that could not be cleared.
    #[error("Could not destroy handle table at slot {slot}: {source}")]
    DestroyFailed
    {
        #[allow(missing_docs)]
        slot: usize,
        #[source]
        source: Box<Error>,
    },

    /// A data type was dispatched to the access method of the wrong width.
    #[error("Data type {0:?} is not valid for this access width")]
    WrongWidth(DataType),

    /// A table configuration has inconsistent values.
    #[error("Invalid table configuration: {0}")]
    InvalidConfig(String),

    /// A table configuration could not be parsed.
    #[error("{0}")]
    ConfigSyntax(#[from] serde_json::Error),
}

/// Error code reported to the virtual machine.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum ErrorCode
{
    OutOfMemory = 1,
    NegativeSize = 2,
    InvalidKind = 3,
    SeedFailure = 4,
    OutOfBounds = 5,
    InvalidHandle = 6,
    DestroyFailed = 7,
    WrongWidth = 8,
    InvalidConfig = 9,
}

impl Error
{
    /// The error code for this error.
    pub fn code(&self) -> ErrorCode
    {
        match self {
            Self::OutOfMemory(..)      => ErrorCode::OutOfMemory,
            Self::NegativeSize(..)     => ErrorCode::NegativeSize,
            Self::InvalidKind(..)      => ErrorCode::InvalidKind,
            Self::SeedFailure{..}      => ErrorCode::SeedFailure,
            Self::OutOfBounds{..}      => ErrorCode::OutOfBounds,
            Self::InvalidHandle(..)    => ErrorCode::InvalidHandle,
            Self::DestroyFailed{..}    => ErrorCode::DestroyFailed,
            Self::WrongWidth(..)       => ErrorCode::WrongWidth,
            Self::InvalidConfig(..)    => ErrorCode::InvalidConfig,
            Self::ConfigSyntax(..)     => ErrorCode::InvalidConfig,
        }
    }

    /// The numeric context that accompanies the error code.
    ///
    /// This is the offending size, kind, identifier, offset, or slot.
    /// Errors without a meaningful number report zero.
    pub fn context(&self) -> i64
    {
        match self {
            Self::OutOfMemory(size)        => *size as i64,
            Self::NegativeSize(size)       => *size as i64,
            Self::InvalidKind(kind)        => *kind as i64,
            Self::SeedFailure{context, ..} => *context,
            Self::OutOfBounds{offset, ..}  => *offset as i64,
            Self::InvalidHandle(id)        => *id as i64,
            Self::DestroyFailed{slot, ..}  => *slot as i64,
            Self::WrongWidth(data_type)    => data_type.size() as i64,
            Self::InvalidConfig(..)        => 0,
            Self::ConfigSyntax(..)         => 0,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn context_carries_offending_value()
    {
        let error = Error::NegativeSize(-1);
        assert_eq!(error.code(), ErrorCode::NegativeSize);
        assert_eq!(error.context(), -1);

        let error = Error::InvalidHandle(0xDEAD_BEEF);
        assert_eq!(error.code(), ErrorCode::InvalidHandle);
        assert_eq!(error.context(), 0xDEAD_BEEF);

        let error = Error::OutOfBounds{offset: 12, length: 4};
        assert_eq!(error.code(), ErrorCode::OutOfBounds);
        assert_eq!(error.context(), 12);
    }

    #[test]
    fn destroy_failure_reports_slot_and_source()
    {
        let error = Error::DestroyFailed{
            slot: 7,
            source: Box::new(Error::InvalidHandle(0x47)),
        };
        assert_eq!(error.code(), ErrorCode::DestroyFailed);
        assert_eq!(error.context(), 7);
        assert_eq!(
            error.to_string(),
            "Could not destroy handle table at slot 7: \
             Invalid handle: 0x00000047",
        );
    }

    #[test]
    fn syntax_errors_share_the_config_code()
    {
        let error: Error =
            serde_json::from_str::<u32>("{").unwrap_err().into();
        assert_eq!(error.code(), ErrorCode::InvalidConfig);
        assert_eq!(error.context(), 0);
    }
}
