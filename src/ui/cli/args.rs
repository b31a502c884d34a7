// Sat Oct 17 2026 - Alex

use crate::output::{ExportFormat, DEFAULT_NAMESPACE};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "offset-dumper")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Signature and string-reference offset dumper for PE modules", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, value_enum, ignore_case = true, default_value_t = LogLevelArg::Info)]
    pub log_level: LogLevelArg,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve every entry of a config and optionally generate code
    Scan(ScanArgs),
    /// Resolve a single ad-hoc lookup against one module
    Probe(ProbeArgs),
    /// Edit or inspect a scan config
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevelArg> for log::LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Trace => log::LevelFilter::Trace,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Off => log::LevelFilter::Off,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Cpp,
    Rust,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Cpp => ExportFormat::CppHeader,
            FormatArg::Rust => ExportFormat::RustModule,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    #[arg(short, long)]
    pub config: PathBuf,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "cpp")]
    pub format: FormatArg,

    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    #[arg(short, long)]
    pub module: PathBuf,

    #[command(flatten)]
    pub target: ProbeTarget,

    #[arg(long, default_value = "0")]
    pub nth_match: usize,

    #[arg(long, default_value = "0")]
    pub reference_instance: usize,

    #[arg(long, default_value = ".text")]
    pub section: String,

    #[arg(long)]
    pub server_bound: bool,

    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub padding: i64,

    #[arg(long, default_value = "0")]
    pub dereferences: usize,
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
pub struct ProbeTarget {
    #[arg(long)]
    pub pattern: Option<String>,

    #[arg(long)]
    pub string: Option<String>,

    #[arg(long)]
    pub convar: Option<String>,

    #[arg(long)]
    pub export: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Add or replace a signature entry
    AddSignature(AddSignatureArgs),
    /// Add or replace a string-search entry
    AddString(AddStringArgs),
    /// Add or replace a convar entry
    AddConvar(AddConVarArgs),
    /// Add or replace an export entry
    AddExport(AddExportArgs),
    /// Print modules and entry counts
    Show(ShowArgs),
}

#[derive(ClapArgs, Debug)]
pub struct EntryArgs {
    #[arg(short, long)]
    pub config: PathBuf,

    #[arg(short, long)]
    pub module: String,

    #[arg(short, long)]
    pub name: String,

    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub padding: i64,

    #[arg(long, default_value = "0")]
    pub dereferences: usize,
}

#[derive(Parser, Debug)]
pub struct AddSignatureArgs {
    #[command(flatten)]
    pub entry: EntryArgs,

    #[arg(short, long)]
    pub signature: String,

    #[arg(long, default_value = "0")]
    pub nth_match: usize,

    #[arg(long, default_value = ".text")]
    pub section: String,
}

#[derive(Parser, Debug)]
pub struct AddStringArgs {
    #[command(flatten)]
    pub entry: EntryArgs,

    #[arg(short, long)]
    pub string: String,

    #[arg(long, default_value = "0")]
    pub reference_instance: usize,

    #[arg(long, default_value = ".text")]
    pub section: String,
}

#[derive(Parser, Debug)]
pub struct AddConVarArgs {
    #[command(flatten)]
    pub entry: EntryArgs,

    #[arg(long)]
    pub convar: String,

    #[arg(long)]
    pub server_bound: bool,
}

#[derive(Parser, Debug)]
pub struct AddExportArgs {
    #[command(flatten)]
    pub entry: EntryArgs,

    #[arg(short, long)]
    pub export: String,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    #[arg(short, long)]
    pub config: PathBuf,
}

impl ScanArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.config.exists() {
            return Err(format!("Config file does not exist: {:?}", self.config));
        }
        Ok(())
    }
}

impl ProbeArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.module.exists() {
            return Err(format!("Module does not exist: {:?}", self.module));
        }
        Ok(())
    }
}
