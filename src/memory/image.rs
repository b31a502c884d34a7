// Fri Oct 16 2026 - Alex

use crate::memory::{Address, MemoryError, MemoryReader};
use ahash::AHashMap;
use goblin::pe::data_directories::DataDirectory;
use goblin::pe::export::{Export, ExportData};
use goblin::pe::header::{Header, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC};
use goblin::pe::optional_header::MAGIC_64;
use goblin::pe::options::ParseOptions;
use goblin::pe::section_table::SectionTable;
use memmap2::Mmap;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub start: usize,
    pub size: usize,
}

impl Section {
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

struct PeLayout {
    image_base: u64,
    size_of_image: usize,
    size_of_headers: usize,
    is_64: bool,
    export_table: Option<DataDirectory>,
    tables: Vec<SectionTable>,
}

impl PeLayout {
    fn parse(bytes: &[u8]) -> Result<Self, MemoryError> {
        let header = Header::parse(bytes)
            .map_err(|e| MemoryError::BinaryParseError(format!("Failed to parse PE headers: {}", e)))?;

        let optional = header.optional_header.ok_or_else(|| {
            MemoryError::BinaryParseError("Missing optional header".to_string())
        })?;

        let size_of_image = optional.windows_fields.size_of_image as usize;
        if size_of_image == 0 {
            return Err(MemoryError::EmptyImage);
        }

        let is_64 = optional.standard_fields.magic == MAGIC_64;
        let optional_start = header.dos_header.pe_pointer as usize + SIZEOF_PE_MAGIC + SIZEOF_COFF_HEADER;
        // goblin only yields the directories NumberOfRvaAndSizes declares.
        let export_table = optional.data_directories.get_export_table().copied()
            .filter(|dd| dd.virtual_address != 0 && dd.size != 0);

        let mut offset = optional_start + header.coff_header.size_of_optional_header as usize;
        let tables = header
            .coff_header
            .sections(bytes, &mut offset)
            .map_err(|e| MemoryError::BinaryParseError(format!("Failed to parse section table: {}", e)))?;

        Ok(Self {
            image_base: optional.windows_fields.image_base,
            size_of_image,
            size_of_headers: optional.windows_fields.size_of_headers as usize,
            is_64,
            export_table,
            tables,
        })
    }
}

/// A PE module laid out the way the loader would map it, held in an owned
/// buffer. Nothing in the module is ever executed.
pub struct Image {
    data: Vec<u8>,
    base_address: Address,
    sections: AHashMap<String, Section>,
    path: Option<PathBuf>,
    is_64: bool,
    exports: AHashMap<String, usize>,
}

impl Image {
    /// Maps a PE file from disk into virtual layout.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MemoryError> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)?;
        // SAFETY: the mapping is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file) }?;

        let layout = PeLayout::parse(&mmap)?;
        let mut data = vec![0u8; layout.size_of_image];

        let headers = layout.size_of_headers.min(mmap.len()).min(data.len());
        data[..headers].copy_from_slice(&mmap[..headers]);

        for table in &layout.tables {
            let raw_start = table.pointer_to_raw_data as usize;
            let raw_end = raw_start.saturating_add(table.size_of_raw_data as usize).min(mmap.len());
            let virtual_start = table.virtual_address as usize;
            if raw_start >= raw_end || virtual_start >= data.len() {
                continue;
            }

            let len = (raw_end - raw_start).min(data.len() - virtual_start);
            data[virtual_start..virtual_start + len].copy_from_slice(&mmap[raw_start..raw_start + len]);
        }

        log::debug!(
            "Mapped {} ({} sections, 0x{:x} bytes)",
            path_buf.display(),
            layout.tables.len(),
            layout.size_of_image
        );

        let mut image = Self::from_layout(data, layout)?;
        image.path = Some(path_buf);
        Ok(image)
    }

    /// Wraps a buffer that is already in virtual layout, such as a copy of
    /// a module resident in some process.
    pub fn from_mapped(bytes: Vec<u8>) -> Result<Self, MemoryError> {
        let layout = PeLayout::parse(&bytes)?;
        let mut data = bytes;
        data.resize(layout.size_of_image, 0);
        Self::from_layout(data, layout)
    }

    fn from_layout(data: Vec<u8>, layout: PeLayout) -> Result<Self, MemoryError> {
        let total = data.len();
        let mut sections = AHashMap::with_capacity(layout.tables.len());

        for table in &layout.tables {
            let name_len = table.name.iter().position(|&b| b == 0).unwrap_or(table.name.len());
            let name = String::from_utf8_lossy(&table.name[..name_len]).into_owned();

            let start = (table.virtual_address as usize).min(total);
            let declared = if table.virtual_size == 0 {
                table.size_of_raw_data
            } else {
                table.virtual_size
            } as usize;
            let size = declared.min(total - start);

            sections.insert(name.clone(), Section { name, start, size });
        }

        if sections.is_empty() {
            return Err(MemoryError::NoSections);
        }

        let exports = match layout.export_table {
            Some(directory) => parse_exports(&data, directory),
            None => AHashMap::new(),
        };

        Ok(Self {
            data,
            base_address: Address::new(layout.image_base),
            sections,
            path: None,
            is_64: layout.is_64,
            exports,
        })
    }

    pub fn base(&self) -> Address {
        self.base_address
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_64(&self) -> bool {
        self.is_64
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> Vec<&Section> {
        let mut sections: Vec<_> = self.sections.values().collect();
        sections.sort_by_key(|s| s.start);
        sections
    }

    /// Range of relative offsets scanned for `section`; unknown names cover
    /// the whole image.
    pub fn scan_window(&self, section: &str) -> Range<usize> {
        match self.sections.get(section) {
            Some(s) => s.range(),
            None => 0..self.data.len(),
        }
    }

    pub fn absolute(&self, offset: usize) -> Address {
        self.base_address + offset as u64
    }

    pub fn relative(&self, addr: Address) -> Option<usize> {
        let offset = addr.offset_from(self.base_address)? as usize;
        (offset < self.data.len()).then_some(offset)
    }

    /// Looks up a named export and returns its absolute address.
    pub fn export(&self, name: &str) -> Option<Address> {
        self.exports.get(name).map(|&rva| self.absolute(rva))
    }

    pub fn export_count(&self) -> usize {
        self.exports.len()
    }
}

/// Named exports of a buffer in virtual layout, keyed to their RVA. A
/// malformed directory leaves the module without exports.
fn parse_exports(data: &[u8], directory: DataDirectory) -> AHashMap<String, usize> {
    // RVAs are already buffer offsets, so goblin must not translate them.
    let mut opts = ParseOptions::default();
    opts.resolve_rva = false;

    let parsed = ExportData::parse_with_opts(data, directory, &[], 0, &opts)
        .and_then(|export_data| Export::parse_with_opts(data, &export_data, &[], 0, &opts));

    match parsed {
        Ok(exports) => exports
            .into_iter()
            .filter_map(|export| Some((export.name?.to_string(), export.rva)))
            .collect(),
        Err(e) => {
            log::warn!("Ignoring malformed export directory: {}", e);
            AHashMap::new()
        }
    }
}

impl MemoryReader for Image {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<&[u8], MemoryError> {
        let start = addr
            .offset_from(self.base_address)
            .ok_or(MemoryError::OutOfBounds(addr.as_u64()))? as usize;
        let end = start.checked_add(len).ok_or(MemoryError::OutOfBounds(addr.as_u64()))?;
        self.data
            .get(start..end)
            .ok_or(MemoryError::OutOfBounds(addr.as_u64()))
    }

    fn pointer_width(&self) -> usize {
        if self.is_64 {
            8
        } else {
            4
        }
    }

    fn base_address(&self) -> Address {
        self.base_address
    }
}
