// Sat Oct 17 2026 - Alex

//! Builds minimal PE images for tests, either already mapped (virtual layout)
//! or as they would sit on disk (file layout).

use crate::memory::Image;

const PE_POINTER: usize = 0x80;
const COFF_OFFSET: usize = PE_POINTER + 4;
const OPTIONAL_OFFSET: usize = COFF_OFFSET + 20;
const SIZE_OF_HEADERS: usize = 0x400;
const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: u32 = 0x1000;
const EXPORT_RVA: u32 = 0xF000;

struct SectionSpec {
    name: String,
    virtual_address: u32,
    data: Vec<u8>,
}

pub struct ImageBuilder {
    base: u64,
    size_of_image: u32,
    is_64: bool,
    directory_count: u32,
    sections: Vec<SectionSpec>,
    exports: Vec<(String, u32)>,
}

impl ImageBuilder {
    pub const DEFAULT_BASE: u64 = 0x1000_0000;
    pub const DEFAULT_SIZE: usize = 0x10000;

    pub fn new() -> Self {
        Self {
            base: Self::DEFAULT_BASE,
            size_of_image: Self::DEFAULT_SIZE as u32,
            is_64: false,
            directory_count: 16,
            sections: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn x64(mut self) -> Self {
        self.is_64 = true;
        self.base = 0x1_8000_0000;
        self
    }

    pub fn base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    pub fn size_of_image(mut self, size: u32) -> Self {
        self.size_of_image = size;
        self
    }

    /// Overrides NumberOfRvaAndSizes; the directory bytes are still written.
    pub fn data_directory_count(mut self, count: u32) -> Self {
        self.directory_count = count;
        self
    }

    pub fn section(mut self, name: &str, virtual_address: u32, data: &[u8]) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            virtual_address,
            data: data.to_vec(),
        });
        self
    }

    pub fn export(mut self, name: &str, rva: u32) -> Self {
        self.exports.push((name.to_string(), rva));
        self
    }

    pub fn build(self) -> Image {
        Image::from_mapped(self.build_mapped()).expect("synthetic image should parse")
    }

    pub fn build_mapped(&self) -> Vec<u8> {
        let sections = self.all_sections();
        let end = sections
            .iter()
            .map(|s| s.virtual_address as usize + s.data.len())
            .max()
            .unwrap_or(0);
        let mut buf = vec![0u8; (self.size_of_image as usize).max(SIZE_OF_HEADERS).max(end)];

        let raw: Vec<_> = sections.iter().map(|s| (s.virtual_address as usize, s.data.len())).collect();
        self.write_headers(&mut buf, &sections, &raw);

        for section in &sections {
            let start = section.virtual_address as usize;
            buf[start..start + section.data.len()].copy_from_slice(&section.data);
        }

        buf
    }

    pub fn build_file(&self) -> Vec<u8> {
        let sections = self.all_sections();
        let mut raw = Vec::with_capacity(sections.len());
        let mut cursor = SIZE_OF_HEADERS;

        for section in &sections {
            let size = align(section.data.len(), FILE_ALIGNMENT);
            raw.push((cursor, size));
            cursor += size;
        }

        let mut buf = vec![0u8; cursor];
        self.write_headers(&mut buf, &sections, &raw);

        for (section, (pointer, _)) in sections.iter().zip(&raw) {
            buf[*pointer..*pointer + section.data.len()].copy_from_slice(&section.data);
        }

        buf
    }

    fn all_sections(&self) -> Vec<SectionSpec> {
        let mut sections: Vec<SectionSpec> = self
            .sections
            .iter()
            .map(|s| SectionSpec {
                name: s.name.clone(),
                virtual_address: s.virtual_address,
                data: s.data.clone(),
            })
            .collect();

        if !self.exports.is_empty() {
            sections.push(SectionSpec {
                name: ".edata".to_string(),
                virtual_address: EXPORT_RVA,
                data: self.export_blob(),
            });
        }

        sections
    }

    fn export_blob(&self) -> Vec<u8> {
        let count = self.exports.len();
        let functions = 0x28;
        let names = functions + count * 4;
        let ordinals = names + count * 4;
        let strings = ordinals + count * 2;

        let mut blob = vec![0u8; strings];
        put_u32(&mut blob, 0x10, 1);
        put_u32(&mut blob, 0x14, count as u32);
        put_u32(&mut blob, 0x18, count as u32);
        put_u32(&mut blob, 0x1C, EXPORT_RVA + functions as u32);
        put_u32(&mut blob, 0x20, EXPORT_RVA + names as u32);
        put_u32(&mut blob, 0x24, EXPORT_RVA + ordinals as u32);

        for (index, (name, rva)) in self.exports.iter().enumerate() {
            put_u32(&mut blob, functions + index * 4, *rva);
            let name_rva = EXPORT_RVA + blob.len() as u32;
            put_u32(&mut blob, names + index * 4, name_rva);
            put_u16(&mut blob, ordinals + index * 2, index as u16);
            blob.extend_from_slice(name.as_bytes());
            blob.push(0);
        }

        blob
    }

    fn write_headers(&self, buf: &mut [u8], sections: &[SectionSpec], raw: &[(usize, usize)]) {
        buf[0..2].copy_from_slice(b"MZ");
        put_u32(buf, 0x3C, PE_POINTER as u32);
        buf[PE_POINTER..PE_POINTER + 4].copy_from_slice(b"PE\0\0");

        let optional_size: usize = if self.is_64 { 0xF0 } else { 0xE0 };
        put_u16(buf, COFF_OFFSET, if self.is_64 { 0x8664 } else { 0x014C });
        put_u16(buf, COFF_OFFSET + 2, sections.len() as u16);
        put_u16(buf, COFF_OFFSET + 16, optional_size as u16);
        put_u16(buf, COFF_OFFSET + 18, 0x2102);

        let o = OPTIONAL_OFFSET;
        put_u16(buf, o, if self.is_64 { 0x20B } else { 0x10B });
        put_u32(buf, o + 20, SECTION_ALIGNMENT);
        if self.is_64 {
            put_u64(buf, o + 24, self.base);
        } else {
            put_u32(buf, o + 28, self.base as u32);
        }
        put_u32(buf, o + 32, SECTION_ALIGNMENT);
        put_u32(buf, o + 36, FILE_ALIGNMENT as u32);
        put_u16(buf, o + 40, 6);
        put_u16(buf, o + 48, 6);
        put_u32(buf, o + 56, self.size_of_image);
        put_u32(buf, o + 60, SIZE_OF_HEADERS as u32);
        put_u16(buf, o + 68, 2);

        let directories = if self.is_64 {
            put_u32(buf, o + 108, self.directory_count);
            o + 112
        } else {
            put_u32(buf, o + 92, self.directory_count);
            o + 96
        };

        if !self.exports.is_empty() {
            put_u32(buf, directories, EXPORT_RVA);
            put_u32(buf, directories + 4, self.export_blob().len() as u32);
        }

        let mut table = o + optional_size;
        for (section, (pointer, raw_size)) in sections.iter().zip(raw) {
            let name = section.name.as_bytes();
            buf[table..table + name.len().min(8)].copy_from_slice(&name[..name.len().min(8)]);
            put_u32(buf, table + 8, section.data.len() as u32);
            put_u32(buf, table + 12, section.virtual_address);
            put_u32(buf, table + 16, *raw_size as u32);
            put_u32(buf, table + 20, *pointer as u32);
            let characteristics = if section.name == ".text" { 0x6000_0020 } else { 0x4000_0040 };
            put_u32(buf, table + 36, characteristics);
            table += 40;
        }
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn align(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
