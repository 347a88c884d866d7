use {
    crate::{Error, Result},
    rand::{RngCore, SeedableRng, rngs::{OsRng, StdRng}},
};

/// Source of random values for handle placement and identifiers.
///
/// Identifiers are only used to spread handles over the table
/// and to catch stale handles; they are not secrets.
pub struct IdSource
{
    rng: Box<dyn RngCore + Send>,
}

impl IdSource
{
    /// Seed a generator from the operating system's entropy source.
    pub fn from_entropy() -> Result<Self>
    {
        let rng = StdRng::from_rng(OsRng)
            .map_err(|source| Error::SeedFailure{context: 0, source})?;
        Ok(Self::from_rng(Box::new(rng)))
    }

    /// Seed a generator deterministically, for replayable runs.
    pub fn from_seed(seed: u64) -> Self
    {
        Self::from_rng(Box::new(StdRng::seed_from_u64(seed)))
    }

    /// Draw values from the given generator.
    pub fn from_rng(rng: Box<dyn RngCore + Send>) -> Self
    {
        Self{rng}
    }

    /// Draw a random 32-bit value.
    ///
    /// `context` is reported in the error if the generator fails.
    pub fn next_u32(&mut self, context: i64) -> Result<u32>
    {
        let mut bytes = [0; 4];
        self.rng.try_fill_bytes(&mut bytes)
            .map_err(|source| Error::SeedFailure{context, source})?;
        Ok(u32::from_le_bytes(bytes))
    }
}

/// Generators that make table behavior predictable in tests.
#[cfg(test)]
pub (crate) mod testing
{
    use {rand::RngCore, std::collections::VecDeque};

    /// Yields the scripted values in order, then a counter.
    pub struct Scripted
    {
        script: VecDeque<u32>,
        after: u32,
    }

    impl Scripted
    {
        pub fn new(script: impl IntoIterator<Item = u32>) -> Self
        {
            Self{script: script.into_iter().collect(), after: 0}
        }
    }

    impl RngCore for Scripted
    {
        fn next_u32(&mut self) -> u32
        {
            self.script.pop_front().unwrap_or_else(|| {
                self.after = self.after.wrapping_add(0x9E37_79B9);
                self.after
            })
        }

        fn next_u64(&mut self) -> u64
        {
            let low = self.next_u32() as u64;
            let high = self.next_u32() as u64;
            high << 32 | low
        }

        fn fill_bytes(&mut self, dest: &mut [u8])
        {
            for chunk in dest.chunks_mut(4) {
                let bytes = self.next_u32().to_le_bytes();
                chunk.copy_from_slice(&bytes[.. chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8])
            -> Result<(), rand::Error>
        {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    /// Fails every draw.
    pub struct Broken;

    impl RngCore for Broken
    {
        fn next_u32(&mut self) -> u32
        {
            panic!("Broken generator used infallibly")
        }

        fn next_u64(&mut self) -> u64
        {
            panic!("Broken generator used infallibly")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8])
        {
            panic!("Broken generator used infallibly")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8])
            -> Result<(), rand::Error>
        {
            Err(rand::Error::new("entropy exhausted"))
        }
    }
}

#[cfg(test)]
mod tests
{
    use {super::{*, testing::{Broken, Scripted}}, crate::ErrorCode};

    #[test]
    fn scripted_values_are_drawn_verbatim()
    {
        let script = [0, 1, 0xDEAD_BEEF, u32::MAX];
        let mut source = IdSource::from_rng(Box::new(Scripted::new(script)));
        for expected in script {
            assert_eq!(source.next_u32(0).unwrap(), expected);
        }
    }

    #[test]
    fn equal_seeds_draw_equal_values()
    {
        let mut a = IdSource::from_seed(42);
        let mut b = IdSource::from_seed(42);
        for _ in 0 .. 16 {
            assert_eq!(a.next_u32(0).unwrap(), b.next_u32(0).unwrap());
        }
    }

    #[test]
    fn entropy_seeding_succeeds()
    {
        let mut source = IdSource::from_entropy().unwrap();
        source.next_u32(0).unwrap();
    }

    #[test]
    fn generator_failure_is_a_seed_failure()
    {
        let mut source = IdSource::from_rng(Box::new(Broken));
        let error = source.next_u32(0x45).unwrap_err();
        assert_eq!(error.code(), ErrorCode::SeedFailure);
        assert_eq!(error.context(), 0x45);
    }
}
