// Fri Oct 16 2026 - Alex

use crate::memory::{Address, Image};
use crate::pattern::Pattern;

pub struct PatternMatcher<'a> {
    image: &'a Image,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(image: &'a Image) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &'a Image {
        self.image
    }

    /// Returns the absolute address of the `match_index`-th (zero based)
    /// occurrence of `pattern` inside `section`, or the whole image when the
    /// section does not exist.
    pub fn find(&self, pattern: &Pattern, section: &str, match_index: usize) -> Option<Address> {
        let window = self.image.scan_window(section);
        let data = &self.image.bytes()[window.clone()];

        let found = pattern
            .find_iter(data)
            .nth(match_index)
            .map(|offset| self.image.absolute(window.start + offset));

        log::trace!(
            "{} in {} (match {}): {}",
            pattern,
            section,
            match_index,
            found.map(|a| a.to_string()).unwrap_or_else(|| "none".to_string())
        );

        found
    }

    pub fn find_first(&self, pattern: &Pattern, section: &str) -> Option<Address> {
        self.find(pattern, section, 0)
    }

    pub fn count(&self, pattern: &Pattern, section: &str) -> usize {
        let window = self.image.scan_window(section);
        pattern.find_iter(&self.image.bytes()[window]).count()
    }
}
