//! Snapshot of which panel buttons are physically held.
//!
//! `PressedSet` is rebuilt from the instantaneous level of every line each
//! time an edge is processed, never accumulated from edges, so a missed or
//! bounced edge cannot leave it out of step with the hardware.

use super::Button;

/// Bitmask of held buttons (see [`Button::mask`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PressedSet(u8);

impl PressedSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set by asking `is_pressed` about every button.
    pub fn poll(mut is_pressed: impl FnMut(Button) -> bool) -> Self {
        Button::ALL
            .into_iter()
            .filter(|&b| is_pressed(b))
            .collect()
    }

    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | button.mask())
    }

    #[must_use]
    pub const fn without(self, button: Button) -> Self {
        Self(self.0 & !button.mask())
    }

    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |&b| self.contains(b))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl FromIterator<Button> for PressedSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}
