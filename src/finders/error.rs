// Sat Oct 17 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("String \"{text}\" not present in {section}")]
    StringNotPresent { text: String, section: String },
}
