//! In-memory world container

use super::fragment::{Fragment, FragmentType};
use super::name_table::{NameRef, NameTable};
use super::version::WorldFormat;

/// A decoded world file.
///
/// Fragments refer to each other by 1-based ordinal: ordinal `n` is
/// `fragments[n - 1]` and ordinal 0 means "no reference".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    pub format: WorldFormat,
    /// Region count as read from the header. The writer recomputes it.
    pub region_count: u32,
    pub name_table: NameTable,
    pub fragments: Vec<Fragment>,
}

impl Container {
    #[must_use]
    pub fn new(format: WorldFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Fragment at a 1-based ordinal.
    #[must_use]
    pub fn fragment(&self, ordinal: u32) -> Option<&Fragment> {
        let index = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        self.fragments.get(index)
    }

    #[must_use]
    pub fn fragment_mut(&mut self, ordinal: u32) -> Option<&mut Fragment> {
        let index = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        self.fragments.get_mut(index)
    }

    /// Append a fragment and return its ordinal.
    pub fn push(&mut self, fragment: Fragment) -> u32 {
        self.fragments.push(fragment);
        self.fragments.len() as u32
    }

    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Fragments paired with their ordinals.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Fragment)> {
        self.fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| (i as u32 + 1, fragment))
    }

    /// Fragments of one type, paired with their ordinals.
    pub fn of_type(&self, kind: FragmentType) -> impl Iterator<Item = (u32, &Fragment)> {
        self.iter().filter(move |(_, f)| f.fragment_type() == kind)
    }

    /// Number of `Region` fragments.
    #[must_use]
    pub fn region_fragment_count(&self) -> u32 {
        self.of_type(FragmentType::Region).count() as u32
    }

    /// Resolve a name held by one of this container's fragments.
    #[must_use]
    pub fn name(&self, name: NameRef) -> Option<&str> {
        self.name_table.resolve(name)
    }

    /// First fragment whose own name equals `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<(u32, &Fragment)> {
        let target = self.name_table.name_ref(name)?;
        self.iter().find(|(_, f)| f.name_ref() == target)
    }
}
