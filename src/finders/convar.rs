// Sat Oct 17 2026 - Alex

use crate::finders::FinderError;
use crate::memory::{Address, Direction, Image};
use crate::xref::ReferenceResolver;

const CODE_SECTION: &str = ".text";

const PUSH_IMM32: u8 = 0x68;
const CALL_REL32: u8 = 0xE8;
const MOV_RM32_IMM32: u8 = 0xC7;
const MOV_ECX_IMM32: u8 = 0xB9;

/// Locates console variable objects through the code that constructs them.
///
/// Server-bound variables are built by a `push` of the description right
/// before the name operand, followed by a `mov [mem], imm32` into the object.
/// Client variables push the name and immediately call the constructor, with
/// the object loaded into `ecx` after the preceding `mov [mem], imm32`.
pub struct ConVarFinder<'a> {
    image: &'a Image,
    resolver: ReferenceResolver<'a>,
}

impl<'a> ConVarFinder<'a> {
    pub fn new(image: &'a Image) -> Self {
        Self {
            image,
            resolver: ReferenceResolver::new(image),
        }
    }

    pub fn find(&self, name: &str, server_bound: bool) -> Result<Option<Address>, FinderError> {
        let Some(reference) = self.constructor_reference(name, server_bound)? else {
            log::debug!("No constructor reference for convar {}", name);
            return Ok(None);
        };

        let marker = if server_bound {
            reference.followed_until(MOV_RM32_IMM32, Direction::Forward, self.image)
        } else {
            reference.followed_until(MOV_RM32_IMM32, Direction::Backward, self.image)
        };

        let target = if server_bound || !marker.is_valid() {
            marker
        } else {
            marker.followed_until(MOV_ECX_IMM32, Direction::Forward, self.image)
        };

        if !target.is_valid() {
            log::debug!("Convar {} reference at {} lost its marker", name, reference);
            return Ok(None);
        }

        Ok(Some(target.padded(1 + server_bound as i64)))
    }

    /// First reference to the name whose neighbouring opcode fits the
    /// constructor idiom.
    fn constructor_reference(&self, name: &str, server_bound: bool) -> Result<Option<Address>, FinderError> {
        let (probe, opcode) = if server_bound {
            (-6, PUSH_IMM32)
        } else {
            (4, CALL_REL32)
        };

        for index in 0.. {
            let Some(reference) = self.resolver.find_string(name, CODE_SECTION, index)? else {
                return Ok(None);
            };

            if matches!(reference.byte_at(probe, self.image), Ok(byte) if byte == opcode) {
                return Ok(Some(reference));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::ImageBuilder;

    const TEXT: usize = 0x1000;
    const RDATA: u32 = 0x4000;

    fn operand(rdata_offset: u32) -> [u8; 4] {
        (ImageBuilder::DEFAULT_BASE as u32 + RDATA + rdata_offset).to_le_bytes()
    }

    fn place(text: &mut [u8], at: usize, bytes: &[u8]) {
        text[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn convar_image() -> Image {
        let server = operand(0x00);
        let client = operand(0x10);
        let mut text = vec![0x90u8; 0x100];

        // server-bound: a decoy reference, then push desc; push name; ...; mov [mem], imm32
        place(&mut text, 0x10, &server);
        place(&mut text, 0x2A, &[PUSH_IMM32]);
        place(&mut text, 0x2F, &[PUSH_IMM32]);
        place(&mut text, 0x30, &server);
        place(&mut text, 0x40, &[MOV_RM32_IMM32]);

        // client: a decoy reference, then mov [mem], imm32; mov ecx, imm32; push name; call
        place(&mut text, 0x70, &client);
        place(&mut text, 0x90, &[MOV_RM32_IMM32]);
        place(&mut text, 0x9A, &[MOV_ECX_IMM32]);
        place(&mut text, 0x9F, &[PUSH_IMM32]);
        place(&mut text, 0xA0, &client);
        place(&mut text, 0xA4, &[CALL_REL32]);

        let mut rdata = vec![0u8; 0x30];
        place(&mut rdata, 0x00, b"sv_cheats\0");
        place(&mut rdata, 0x10, b"cl_interp\0");
        place(&mut rdata, 0x20, b"unused\0");

        ImageBuilder::new()
            .section(".text", TEXT as u32, &text)
            .section(".rdata", RDATA, &rdata)
            .build()
    }

    #[test]
    fn test_server_bound_convar() {
        let image = convar_image();
        let finder = ConVarFinder::new(&image);

        let found = finder.find("sv_cheats", true).unwrap();
        assert_eq!(found, Some(image.absolute(TEXT + 0x40 + 2)));
    }

    #[test]
    fn test_client_convar() {
        let image = convar_image();
        let finder = ConVarFinder::new(&image);

        let found = finder.find("cl_interp", false).unwrap();
        assert_eq!(found, Some(image.absolute(TEXT + 0x9A + 1)));
    }

    #[test]
    fn test_wrong_idiom_is_not_found() {
        let image = convar_image();
        let finder = ConVarFinder::new(&image);

        assert_eq!(finder.find("sv_cheats", false).unwrap(), None);
        assert_eq!(finder.find("unused", true).unwrap(), None);
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let image = convar_image();
        let finder = ConVarFinder::new(&image);

        assert!(matches!(
            finder.find("mp_timelimit", true),
            Err(FinderError::StringNotPresent { .. })
        ));
    }
}
