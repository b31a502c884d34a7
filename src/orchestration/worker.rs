// Sat Oct 17 2026 - Alex

use crate::config::{ConVarSpec, ExportSpec, ModuleSpec, SignatureSpec, StringSearchSpec};
use crate::finders::{ConVarFinder, FinderError};
use crate::memory::{Address, Image, MemoryError};
use crate::orchestration::{ModuleLoader, ScanError};
use crate::pattern::{Pattern, PatternMatcher};
use crate::xref::ReferenceResolver;
use indexmap::IndexMap;

/// One entry of a module spec, whatever its kind.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'s> {
    Signature(&'s SignatureSpec),
    StringSearch(&'s StringSearchSpec),
    ConVar(&'s ConVarSpec),
    Export(&'s ExportSpec),
}

impl<'s> Lookup<'s> {
    pub fn padding(&self) -> i64 {
        match self {
            Lookup::Signature(s) => s.padding,
            Lookup::StringSearch(s) => s.padding,
            Lookup::ConVar(s) => s.padding,
            Lookup::Export(s) => s.padding,
        }
    }

    pub fn dereferences(&self) -> usize {
        match self {
            Lookup::Signature(s) => s.dereferences,
            Lookup::StringSearch(s) => s.dereferences,
            Lookup::ConVar(s) => s.dereferences,
            Lookup::Export(s) => s.dereferences,
        }
    }

    /// All entries of a module in resolution order.
    pub fn all(spec: &'s ModuleSpec) -> impl Iterator<Item = (&'s str, Lookup<'s>)> {
        let signatures = spec.signatures.iter().map(|(n, s)| (n.as_str(), Lookup::Signature(s)));
        let strings = spec.string_search.iter().map(|(n, s)| (n.as_str(), Lookup::StringSearch(s)));
        let convars = spec.convars.iter().map(|(n, s)| (n.as_str(), Lookup::ConVar(s)));
        let exports = spec.exports.iter().map(|(n, s)| (n.as_str(), Lookup::Export(s)));

        signatures.chain(strings).chain(convars).chain(exports)
    }
}

/// Resolves entries against one loaded image.
pub struct ModuleWorker<'a> {
    module: &'a str,
    image: &'a Image,
}

impl<'a> ModuleWorker<'a> {
    pub fn new(module: &'a str, image: &'a Image) -> Self {
        Self { module, image }
    }

    pub fn image(&self) -> &'a Image {
        self.image
    }

    /// Resolves every entry of `spec`; the first failure aborts the module.
    pub fn run(&self, spec: &ModuleSpec) -> Result<IndexMap<String, u64>, ScanError> {
        let mut offsets = IndexMap::with_capacity(spec.entry_count());

        for (entry, lookup) in Lookup::all(spec) {
            let offset = self.resolve(entry, lookup)?;
            log::debug!("{}: {} = 0x{:x}", self.module, entry, offset);
            offsets.insert(entry.to_string(), offset);
        }

        Ok(offsets)
    }

    /// Locates the entry, applies padding then dereferences, and returns the
    /// result relative to the image base.
    pub fn resolve(&self, entry: &str, lookup: Lookup<'_>) -> Result<u64, ScanError> {
        let found = self.locate(entry, lookup)?;

        let resolved = found
            .padded(lookup.padding())
            .dereferenced(lookup.dereferences(), self.image)
            .map_err(|source| self.dereference_error(entry, source))?;

        resolved
            .offset_from(self.image.base())
            .ok_or_else(|| self.dereference_error(entry, MemoryError::OutOfBounds(resolved.as_u64())))
    }

    /// The raw address of the entry before padding and dereferencing.
    pub fn locate(&self, entry: &str, lookup: Lookup<'_>) -> Result<Address, ScanError> {
        match lookup {
            Lookup::Signature(spec) => {
                let pattern = Pattern::parse(&spec.signature).map_err(|source| ScanError::InvalidPattern {
                    module: self.module.to_string(),
                    entry: entry.to_string(),
                    source,
                })?;

                PatternMatcher::new(self.image)
                    .find(&pattern, &spec.section, spec.nth_match)
                    .ok_or_else(|| {
                        self.not_found(
                            entry,
                            format!("match {} of signature in {}", spec.nth_match, spec.section),
                        )
                    })
            }
            Lookup::StringSearch(spec) => ReferenceResolver::new(self.image)
                .find_string(&spec.string, &spec.section, spec.reference_instance)
                .map_err(|e| self.finder_error(entry, e))?
                .ok_or_else(|| {
                    self.not_found(
                        entry,
                        format!(
                            "reference {} to \"{}\" in {}",
                            spec.reference_instance, spec.string, spec.section
                        ),
                    )
                }),
            Lookup::ConVar(spec) => ConVarFinder::new(self.image)
                .find(&spec.convar, spec.server_bound)
                .map_err(|e| self.finder_error(entry, e))?
                .ok_or_else(|| self.not_found(entry, format!("constructor of convar {}", spec.convar))),
            Lookup::Export(spec) => self
                .image
                .export(&spec.export)
                .ok_or_else(|| self.not_found(entry, format!("export {}", spec.export))),
        }
    }

    fn not_found(&self, entry: &str, reason: String) -> ScanError {
        ScanError::NotFound {
            module: self.module.to_string(),
            entry: entry.to_string(),
            reason,
        }
    }

    fn dereference_error(&self, entry: &str, source: MemoryError) -> ScanError {
        ScanError::Dereference {
            module: self.module.to_string(),
            entry: entry.to_string(),
            source,
        }
    }

    fn finder_error(&self, entry: &str, error: FinderError) -> ScanError {
        match error {
            FinderError::StringNotPresent { .. } => self.not_found(entry, error.to_string()),
        }
    }
}

/// Loads `module` and resolves all of its entries.
pub fn scan_module(
    module: &str,
    spec: &ModuleSpec,
    loader: &dyn ModuleLoader,
) -> Result<IndexMap<String, u64>, ScanError> {
    log::info!("Scanning {} ({} entries)", module, spec.entry_count());

    let image = loader.load(module).map_err(|source| ScanError::Load {
        module: module.to_string(),
        source,
    })?;

    let result = ModuleWorker::new(module, &image).run(spec);
    match &result {
        Ok(offsets) => log::info!("Finished {} ({} offsets)", module, offsets.len()),
        Err(e) => log::warn!("{}", e),
    }

    result
}
