use crate::{Error, Result};

/// What the payload of a handle represents.
///
/// The numeric codes are shared with the object model of the virtual machine.
/// [`Undefined`][`Self::Undefined`] and [`COUNT`][`Self::COUNT`]
/// are sentinels and never describe a live handle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum HandleKind
{
    /// Reserved; never valid for a handle.
    Undefined = 0,

    /// Plain byte buffer.
    Blob = 1,

    /// Object instance.
    Object = 2,

    /// Array of primitives or references.
    Array = 3,

    /// Class metadata.
    ClassInfo = 4,
}

impl HandleKind
{
    /// One past the greatest valid kind code.
    pub const COUNT: i32 = 5;

    /// The numeric code of this kind.
    pub fn code(self) -> i32
    {
        self as i32
    }

    /// Whether handles may be created with this kind.
    pub fn is_valid(self) -> bool
    {
        let code = self.code();
        code > Self::Undefined.code() && code < Self::COUNT
    }
}

impl TryFrom<i32> for HandleKind
{
    type Error = Error;

    /// Convert a kind code, rejecting both sentinels.
    fn try_from(code: i32) -> Result<Self>
    {
        match code {
            1 => Ok(Self::Blob),
            2 => Ok(Self::Object),
            3 => Ok(Self::Array),
            4 => Ok(Self::ClassInfo),
            _ => Err(Error::InvalidKind(code)),
        }
    }
}

#[cfg(test)]
mod tests
{
    use {super::*, proptest::proptest};

    #[test]
    fn sentinels_are_rejected()
    {
        assert!(!HandleKind::Undefined.is_valid());
        assert!(matches!(
            HandleKind::try_from(HandleKind::Undefined.code()),
            Err(Error::InvalidKind(0)),
        ));
        assert!(matches!(
            HandleKind::try_from(HandleKind::COUNT),
            Err(Error::InvalidKind(HandleKind::COUNT)),
        ));
    }

    #[test]
    fn every_valid_code_converts_back()
    {
        for code in 1 .. HandleKind::COUNT {
            let kind = HandleKind::try_from(code).unwrap();
            assert!(kind.is_valid());
            assert_eq!(kind.code(), code);
        }
    }

    proptest!
    {
        #[test]
        fn conversion_agrees_with_range(code: i32)
        {
            let in_range = code > 0 && code < HandleKind::COUNT;
            assert_eq!(HandleKind::try_from(code).is_ok(), in_range);
        }
    }
}
