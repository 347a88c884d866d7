/// Primitive data type for typed access to handle payloads.
///
/// Narrow types (at most four bytes) are accessed through `i32` values,
/// wide types (eight bytes) through `i64` values.
/// Floating-point types carry their IEEE 754 bit patterns.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DataType
{
    /// Signed 8-bit integer.
    Byte,

    /// Signed 16-bit integer.
    Short,

    /// Unsigned 16-bit integer.
    Character,

    /// Signed 32-bit integer.
    Integer,

    /// 32-bit floating-point number.
    Float,

    /// Signed 64-bit integer.
    Long,

    /// 64-bit floating-point number.
    Double,
}

impl DataType
{
    /// Every data type, narrow types first.
    pub const ALL: [Self; 7] = [
        Self::Byte,
        Self::Short,
        Self::Character,
        Self::Integer,
        Self::Float,
        Self::Long,
        Self::Double,
    ];

    /// The number of payload bytes a value of this type occupies.
    pub fn size(self) -> i32
    {
        match self {
            Self::Byte => 1,
            Self::Short | Self::Character => 2,
            Self::Integer | Self::Float => 4,
            Self::Long | Self::Double => 8,
        }
    }

    /// Whether values of this type are accessed as `i64`.
    pub fn is_wide(self) -> bool
    {
        self.size() == 8
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn only_eight_byte_types_are_wide()
    {
        for data_type in DataType::ALL {
            assert_eq!(data_type.is_wide(), data_type.size() == 8);
            assert!([1, 2, 4, 8].contains(&data_type.size()));
        }
        assert!(DataType::Long.is_wide());
        assert!(DataType::Double.is_wide());
        assert!(!DataType::Float.is_wide());
    }
}
