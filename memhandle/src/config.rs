use {
    crate::{Error, Result},
    serde::{Deserialize, Serialize},
    std::io::Read,
};

/// Capacity of a freshly created table, and the least allowed.
pub const INITIAL_CAPACITY: usize = 64;

/// Greatest capacity a table may grow to by default.
pub const DEFAULT_MAX_CAPACITY: usize = 1 << 24;

/// Greatest capacity whose slot mask leaves identifiers a random bit.
pub const CAPACITY_LIMIT: usize = 1 << 31;

/// Settings for a [handle table].
///
/// Tables are normally configured by the virtual machine's startup options,
/// which arrive as JSON. Missing fields take their default values.
///
/// [handle table]: `crate::HandleTable`
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig
{
    /// Number of slots the table starts with.
    ///
    /// Must be a power of two no less than [`INITIAL_CAPACITY`].
    pub initial_capacity: usize,

    /// Number of slots beyond which the table will not grow.
    ///
    /// Must be a power of two no less than the initial capacity
    /// and no greater than [`CAPACITY_LIMIT`].
    pub max_capacity: usize,

    /// Seed for the identifier generator.
    ///
    /// If absent, the generator is seeded from the operating system.
    pub seed: Option<u64>,
}

impl Default for TableConfig
{
    fn default() -> Self
    {
        Self{
            initial_capacity: INITIAL_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            seed: None,
        }
    }
}

impl TableConfig
{
    /// Parse and validate a configuration.
    pub fn from_json(json: &str) -> Result<Self>
    {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a configuration.
    pub fn from_reader(reader: impl Read) -> Result<Self>
    {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the capacities are consistent.
    pub fn validate(&self) -> Result<()>
    {
        let Self{initial_capacity, max_capacity, ..} = *self;

        if !initial_capacity.is_power_of_two()
            || initial_capacity < INITIAL_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "initial_capacity {} must be a power of two of at least {}",
                initial_capacity, INITIAL_CAPACITY,
            )));
        }

        if !max_capacity.is_power_of_two()
            || max_capacity < initial_capacity
            || max_capacity > CAPACITY_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "max_capacity {} must be a power of two between {} and {}",
                max_capacity, initial_capacity, CAPACITY_LIMIT,
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use {super::*, crate::ErrorCode};

    #[test]
    fn empty_object_gives_defaults()
    {
        let config = TableConfig::from_json("{}").unwrap();
        assert_eq!(config, TableConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn fields_are_read()
    {
        let json = r#"
            {
                "initial_capacity": 256,
                "max_capacity": 4096,
                "seed": 7
            }
        "#;
        let config = TableConfig::from_reader(json.as_bytes()).unwrap();
        assert_eq!(config.initial_capacity, 256);
        assert_eq!(config.max_capacity, 4096);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn inconsistent_capacities_are_rejected()
    {
        for json in [
            r#"{"initial_capacity": 32}"#,
            r#"{"initial_capacity": 100}"#,
            r#"{"initial_capacity": 128, "max_capacity": 64}"#,
            r#"{"max_capacity": 3000}"#,
            r#"{"max_capacity": 4294967296}"#,
        ] {
            let error = TableConfig::from_json(json).unwrap_err();
            assert!(
                matches!(error, Error::InvalidConfig(..)),
                "{json}: {error}",
            );
        }
    }

    #[test]
    fn unknown_fields_are_rejected()
    {
        let error = TableConfig::from_json(r#"{"capacity": 64}"#).unwrap_err();
        assert!(matches!(error, Error::ConfigSyntax(..)));
        assert_eq!(error.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn round_trips_through_json()
    {
        let config = TableConfig{seed: Some(99), ..TableConfig::default()};
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(TableConfig::from_json(&json).unwrap(), config);
    }
}
