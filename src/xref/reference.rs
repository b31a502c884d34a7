// Sat Oct 17 2026 - Alex

use crate::finders::FinderError;
use crate::memory::{Address, Image};
use crate::pattern::{Pattern, PatternMatcher};

pub const STRING_SECTION: &str = ".rdata";

/// Finds code that embeds the absolute address of a string literal.
pub struct ReferenceResolver<'a> {
    matcher: PatternMatcher<'a>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(image: &'a Image) -> Self {
        Self {
            matcher: PatternMatcher::new(image),
        }
    }

    /// Absolute address of the first NUL-terminated copy of `text` in `.rdata`.
    pub fn locate_string(&self, text: &str) -> Result<Address, FinderError> {
        let mut needle = Vec::with_capacity(text.len() + 1);
        needle.extend_from_slice(text.as_bytes());
        needle.push(0);

        self.matcher
            .find_first(&Pattern::from_bytes(&needle), STRING_SECTION)
            .ok_or_else(|| FinderError::StringNotPresent {
                text: text.to_string(),
                section: STRING_SECTION.to_string(),
            })
    }

    /// Location of the `reference_index`-th embedded copy of the string's
    /// address in `section`. The operand is 32 bits wide, so only the low
    /// half of the address is searched for.
    pub fn find_string(
        &self,
        text: &str,
        section: &str,
        reference_index: usize,
    ) -> Result<Option<Address>, FinderError> {
        let string = self.locate_string(text)?;
        let operand = Pattern::from_bytes(&(string.as_u64() as u32).to_le_bytes());

        let found = self.matcher.find(&operand, section, reference_index);
        log::debug!(
            "\"{}\" at {} -> reference {} in {}: {:?}",
            text,
            string,
            reference_index,
            section,
            found
        );

        Ok(found)
    }
}
