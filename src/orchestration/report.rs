// Sat Oct 17 2026 - Alex

use crate::orchestration::ScanError;
use indexmap::IndexMap;

pub type ModuleOffsets = IndexMap<String, u64>;
pub type ModuleOutcome = Result<ModuleOffsets, ScanError>;

/// Outcome of every configured module, in declaration order.
#[derive(Debug, Default)]
pub struct ScanReport {
    modules: IndexMap<String, ModuleOutcome>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: impl Into<String>, outcome: ModuleOutcome) {
        self.modules.insert(module.into(), outcome);
    }

    pub fn get(&self, module: &str) -> Option<&ModuleOutcome> {
        self.modules.get(module)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleOutcome)> {
        self.modules.iter().map(|(module, outcome)| (module.as_str(), outcome))
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &ModuleOffsets)> {
        self.modules
            .iter()
            .filter_map(|(module, outcome)| outcome.as_ref().ok().map(|offsets| (module.as_str(), offsets)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ScanError)> {
        self.modules
            .iter()
            .filter_map(|(module, outcome)| outcome.as_ref().err().map(|e| (module.as_str(), e)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn offset_count(&self) -> usize {
        self.succeeded().map(|(_, offsets)| offsets.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<(String, ModuleOutcome)> for ScanReport {
    fn from_iter<I: IntoIterator<Item = (String, ModuleOutcome)>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}
