// Sat Oct 17 2026 - Alex

use crate::orchestration::{ModuleOffsets, ScanReport};
use ahash::AHashSet;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_NAMESPACE: &str = "offsets";

static NON_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("identifier regex is valid"));

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn",
    "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let", "loop",
    "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "static",
    "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use", "virtual", "where",
    "while", "yield",
];

// Keywords that cannot be written as raw identifiers.
const RUST_RESERVED: &[&str] = &["_", "crate", "self", "Self", "super"];

const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break", "case",
    "catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept", "const",
    "consteval", "constexpr", "constinit", "const_cast", "continue", "co_await", "co_return",
    "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast", "else", "enum",
    "explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int",
    "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq", "nullptr", "operator", "or",
    "or_eq", "private", "protected", "public", "register", "reinterpret_cast", "requires", "return",
    "short", "signed", "sizeof", "static", "static_assert", "static_cast", "struct", "switch",
    "template", "this", "thread_local", "throw", "true", "try", "typedef", "typeid", "typename",
    "union", "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
];

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    CppHeader,
    RustModule,
    Json,
}

/// Turns arbitrary text into a C/C++/Rust identifier.
pub fn sanitize_identifier(name: &str) -> String {
    let mut result = NON_IDENTIFIER.replace_all(name, "_").into_owned();
    if result.is_empty() || result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// File name of a module path without its extension. Both `\` and `/` count
/// as separators so Windows paths work on any host.
pub fn module_stem(path: &str) -> &str {
    let name = path.rsplit(['\\', '/']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Makes user text safe to place after `//`: control characters are
/// escaped and a trailing backslash, which would splice the next line into
/// a C++ comment, is dropped.
fn comment_text(text: &str) -> String {
    let mut line = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            line.extend(c.escape_default());
        } else {
            line.push(c);
        }
    }
    line.trim_end_matches('\\').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Cpp,
    Rust,
}

impl Dialect {
    fn identifier(self, name: &str) -> String {
        let name = sanitize_identifier(name);
        match self {
            Dialect::Cpp if CPP_KEYWORDS.contains(&name.as_str()) => format!("{}_", name),
            Dialect::Rust if RUST_RESERVED.contains(&name.as_str()) => format!("{}_", name),
            _ => name,
        }
    }

    fn spelled(self, name: String) -> String {
        if self == Dialect::Rust && RUST_KEYWORDS.contains(&name.as_str()) {
            format!("r#{}", name)
        } else {
            name
        }
    }
}

/// Hands out identifiers within one scope, suffixing `_2`, `_3`, ... when
/// distinct names sanitize to the same text.
struct Scope {
    dialect: Dialect,
    taken: AHashSet<String>,
}

impl Scope {
    fn new(dialect: Dialect) -> Self {
        Self { dialect, taken: AHashSet::new() }
    }

    fn claim(&mut self, name: &str) -> String {
        let base = self.dialect.identifier(name);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !self.taken.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.dialect.spelled(candidate)
    }
}

pub struct OffsetExporter {
    namespace: String,
    include_comments: bool,
    source: Option<String>,
}

impl OffsetExporter {
    pub fn new() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            include_comments: true,
            source: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn with_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    /// Names the config the report came from in the generated header.
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn export(&self, report: &ScanReport, format: ExportFormat) -> Result<String, OutputError> {
        match format {
            ExportFormat::CppHeader => Ok(self.export_cpp_header(report)),
            ExportFormat::RustModule => Ok(self.export_rust_module(report)),
            ExportFormat::Json => self.export_json(report),
        }
    }

    pub fn export_to_file(&self, report: &ScanReport, format: ExportFormat, path: &Path) -> Result<(), OutputError> {
        let content = self.export(report, format)?;
        fs::write(path, content)?;
        log::info!("Wrote {} offsets to {}", report.offset_count(), path.display());
        Ok(())
    }

    fn write_source(&self, code: &mut String) {
        if self.include_comments {
            if let Some(source) = &self.source {
                let _ = writeln!(code, "// {}", comment_text(source));
            }
        }
    }

    fn export_cpp_header(&self, report: &ScanReport) -> String {
        let mut code = String::new();

        code.push_str("#pragma once\n\n");
        code.push_str("#include <cstdint>\n\n");
        self.write_source(&mut code);

        let root = Dialect::Cpp.identifier(&self.namespace);
        let _ = writeln!(code, "namespace {} {{", root);

        let mut modules = Scope::new(Dialect::Cpp);
        for (module, outcome) in report.iter() {
            match outcome {
                Ok(offsets) => {
                    if self.include_comments {
                        let _ = writeln!(code, "    // {}", comment_text(module));
                    }
                    let namespace = modules.claim(module_stem(module));
                    let _ = writeln!(code, "    namespace {} {{", namespace);
                    let mut entries = Scope::new(Dialect::Cpp);
                    for (entry, offset) in offsets {
                        let _ = writeln!(
                            code,
                            "        constexpr std::uintptr_t {} = 0x{:x};",
                            entries.claim(entry),
                            offset
                        );
                    }
                    let _ = writeln!(code, "    }} // namespace {}", namespace);
                }
                Err(e) => {
                    let failure = format!("{}: failed ({}): {}", module, e.kind(), e);
                    let _ = writeln!(code, "    // {}", comment_text(&failure));
                }
            }
        }

        let _ = writeln!(code, "}} // namespace {}", root);
        code
    }

    fn export_rust_module(&self, report: &ScanReport) -> String {
        let mut code = String::new();
        self.write_source(&mut code);

        let root = Scope::new(Dialect::Rust).claim(&self.namespace);
        code.push_str("#[allow(dead_code, non_snake_case, non_upper_case_globals)]\n");
        let _ = writeln!(code, "pub mod {} {{", root);

        let mut modules = Scope::new(Dialect::Rust);
        for (module, outcome) in report.iter() {
            match outcome {
                Ok(offsets) => {
                    if self.include_comments {
                        let _ = writeln!(code, "    // {}", comment_text(module));
                    }
                    let _ = writeln!(code, "    pub mod {} {{", modules.claim(module_stem(module)));
                    let mut entries = Scope::new(Dialect::Rust);
                    for (entry, offset) in offsets {
                        let _ = writeln!(
                            code,
                            "        pub const {}: usize = 0x{:x};",
                            entries.claim(entry),
                            offset
                        );
                    }
                    code.push_str("    }\n");
                }
                Err(e) => {
                    let failure = format!("{}: failed ({}): {}", module, e.kind(), e);
                    let _ = writeln!(code, "    // {}", comment_text(&failure));
                }
            }
        }

        code.push_str("}\n");
        code
    }

    fn export_json(&self, report: &ScanReport) -> Result<String, OutputError> {
        let modules: IndexMap<&str, &ModuleOffsets> = report.succeeded().collect();
        Ok(serde_json::to_string_pretty(&modules)?)
    }
}

impl Default for OffsetExporter {
    fn default() -> Self {
        Self::new()
    }
}
