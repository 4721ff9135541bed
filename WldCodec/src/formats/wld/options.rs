//! Options for reading world files

/// Options controlling how strictly a world file is checked while reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Require the header region count to match the number of `Region` fragments.
    pub strict_region_count: bool,
    /// Require every name slot to hit an entry of the name table.
    pub validate_names: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            strict_region_count: true,
            validate_names: true,
        }
    }
}

impl ReadOptions {
    /// Create options with all checks enabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a region count mismatch fails the read
    #[must_use]
    pub fn with_strict_region_count(mut self, strict: bool) -> Self {
        self.strict_region_count = strict;
        self
    }

    /// Set whether unresolvable name slots fail the read
    #[must_use]
    pub fn with_validate_names(mut self, validate: bool) -> Self {
        self.validate_names = validate;
        self
    }

    /// Disable every optional check
    #[must_use]
    pub fn lenient() -> Self {
        Self::new().with_strict_region_count(false).with_validate_names(false)
    }
}
