//! Save engine configuration.

/// How a single sector image reaches the flash chip.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommitStrategy {
    /// One erase + program + verify call per sector.
    ProgramAndVerify,
    /// Erase, program every byte except the first security byte, then
    /// program that byte last. A sector torn before the final byte never
    /// carries the security magic.
    CommitByte,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StoreConfig {
    pub strategy: CommitStrategy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let strategy = if cfg!(feature = "commit-byte") {
            CommitStrategy::CommitByte
        } else {
            CommitStrategy::ProgramAndVerify
        };

        Self { strategy }
    }
}

impl StoreConfig {
    pub const fn with_strategy(mut self, strategy: CommitStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
