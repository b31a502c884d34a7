// Sat Oct 17 2026 - Alex

use super::args::{
    AddConVarArgs, AddExportArgs, AddSignatureArgs, AddStringArgs, Args, Command, ConfigCommand, ProbeArgs,
    ScanArgs, ShowArgs,
};
use crate::config::{ConVarSpec, ExportSpec, ScanConfig, SignatureSpec, StringSearchSpec};
use crate::memory::Image;
use crate::orchestration::{Lookup, ModuleWorker, ScanCoordinator, ScanReport};
use crate::output::{module_stem, OffsetExporter};
use crate::pattern::{Pattern, PatternMatcher};
use crate::ui::spinner::ScanSpinner;
use crate::utils::{format_duration, measure_time, pluralize};
use anyhow::{anyhow, Context};
use colored::Colorize;

const PROBE_ENTRY: &str = "probe";

pub struct CommandHandler {
    quiet: bool,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn execute(mut self, args: Args) -> anyhow::Result<()> {
        self.setup_logging(&args)?;
        self.quiet = args.quiet;

        if args.no_color {
            colored::control::set_override(false);
        }

        match args.command {
            Command::Scan(scan_args) => self.handle_scan(scan_args),
            Command::Probe(probe_args) => self.handle_probe(probe_args),
            Command::Config(config_command) => self.handle_config(config_command),
        }
    }

    fn setup_logging(&self, args: &Args) -> anyhow::Result<()> {
        let level = log::LevelFilter::from(args.log_level);
        let level = if args.quiet { level.min(log::LevelFilter::Warn) } else { level };

        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .try_init()
            .context("Failed to initialise logging")?;

        Ok(())
    }

    fn handle_scan(&self, args: ScanArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow!(e))?;

        let config = ScanConfig::load(&args.config)
            .with_context(|| format!("Failed to load config {}", args.config.display()))?;
        config.validate()?;

        let coordinator = ScanCoordinator::new(&config);
        let spinner = ScanSpinner::new(
            &format!("Scanning {} modules...", coordinator.module_count()),
            !self.quiet,
        );
        let (report, elapsed) = measure_time(|| coordinator.run());
        spinner.finish();

        self.print_report(&report);
        if !self.quiet {
            println!(
                "{} Scanned {} ({}) in {}",
                "[*]".blue(),
                pluralize(report.len(), "module", "modules"),
                pluralize(report.offset_count(), "offset", "offsets"),
                format_duration(elapsed)
            );
        }

        if let Some(output) = &args.output {
            OffsetExporter::new()
                .with_namespace(&args.namespace)
                .with_source(&args.config.display().to_string())
                .export_to_file(&report, args.format.into(), output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            if !self.quiet {
                println!("{} Output written to: {}", "[+]".green(), output.display());
            }
        }

        let failed = report.failed().count();
        if failed > 0 {
            return Err(anyhow!("{} of {} modules failed", failed, report.len()));
        }

        Ok(())
    }

    fn print_report(&self, report: &ScanReport) {
        for (module, outcome) in report.iter() {
            match outcome {
                Ok(offsets) => {
                    if self.quiet {
                        continue;
                    }
                    println!("{} {} ({})", "[+]".green(), module, module_stem(module));
                    for (entry, offset) in offsets {
                        println!("{}\t{}={:x}", "[-]".cyan(), entry, offset);
                    }
                }
                Err(e) => eprintln!("{} {}: {}", "[!]".red(), module, e),
            }
        }
    }

    fn handle_probe(&self, args: ProbeArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow!(e))?;

        let module = args.module.display().to_string();
        let image = Image::load(&args.module).with_context(|| format!("Failed to load {}", module))?;
        let worker = ModuleWorker::new(&module, &image);

        let target = &args.target;
        let offset = if let Some(signature) = &target.pattern {
            let pattern = Pattern::parse(signature)?;
            let count = PatternMatcher::new(&image).count(&pattern, &args.section);
            if !self.quiet {
                println!("{} {} matches in {}", "[*]".blue(), count, args.section);
            }

            let spec = SignatureSpec {
                signature: signature.clone(),
                nth_match: args.nth_match,
                padding: args.padding,
                dereferences: args.dereferences,
                section: args.section.clone(),
            };
            worker.resolve(PROBE_ENTRY, Lookup::Signature(&spec))?
        } else if let Some(string) = &target.string {
            let spec = StringSearchSpec {
                string: string.clone(),
                reference_instance: args.reference_instance,
                padding: args.padding,
                dereferences: args.dereferences,
                section: args.section.clone(),
            };
            worker.resolve(PROBE_ENTRY, Lookup::StringSearch(&spec))?
        } else if let Some(convar) = &target.convar {
            let spec = ConVarSpec {
                convar: convar.clone(),
                server_bound: args.server_bound,
                padding: args.padding,
                dereferences: args.dereferences,
            };
            worker.resolve(PROBE_ENTRY, Lookup::ConVar(&spec))?
        } else if let Some(export) = &target.export {
            let spec = ExportSpec {
                export: export.clone(),
                padding: args.padding,
                dereferences: args.dereferences,
            };
            worker.resolve(PROBE_ENTRY, Lookup::Export(&spec))?
        } else {
            return Err(anyhow!("Nothing to probe"));
        };

        println!("{} {} ({})", "[+]".green(), module, module_stem(&module));
        println!("{}\t{}={:x}", "[-]".cyan(), PROBE_ENTRY, offset);
        Ok(())
    }

    fn handle_config(&self, command: ConfigCommand) -> anyhow::Result<()> {
        match command {
            ConfigCommand::AddSignature(args) => self.add_signature(args),
            ConfigCommand::AddString(args) => self.add_string(args),
            ConfigCommand::AddConvar(args) => self.add_convar(args),
            ConfigCommand::AddExport(args) => self.add_export(args),
            ConfigCommand::Show(args) => self.show_config(args),
        }
    }

    fn add_signature(&self, args: AddSignatureArgs) -> anyhow::Result<()> {
        Pattern::parse(&args.signature)?;

        let entry = args.entry;
        let mut config = ScanConfig::load_or_default(&entry.config)?;
        let module = config.module_mut(&entry.module);
        module.remove_entry(&entry.name);
        module.signatures.insert(
            entry.name.clone(),
            SignatureSpec {
                signature: args.signature,
                nth_match: args.nth_match,
                padding: entry.padding,
                dereferences: entry.dereferences,
                section: args.section,
            },
        );

        config.save(&entry.config)?;
        self.report_added("signature", &entry.module, &entry.name);
        Ok(())
    }

    fn add_string(&self, args: AddStringArgs) -> anyhow::Result<()> {
        let entry = args.entry;
        let mut config = ScanConfig::load_or_default(&entry.config)?;
        let module = config.module_mut(&entry.module);
        module.remove_entry(&entry.name);
        module.string_search.insert(
            entry.name.clone(),
            StringSearchSpec {
                string: args.string,
                reference_instance: args.reference_instance,
                padding: entry.padding,
                dereferences: entry.dereferences,
                section: args.section,
            },
        );

        config.save(&entry.config)?;
        self.report_added("string search", &entry.module, &entry.name);
        Ok(())
    }

    fn add_convar(&self, args: AddConVarArgs) -> anyhow::Result<()> {
        let entry = args.entry;
        let mut config = ScanConfig::load_or_default(&entry.config)?;
        let module = config.module_mut(&entry.module);
        module.remove_entry(&entry.name);
        module.convars.insert(
            entry.name.clone(),
            ConVarSpec {
                convar: args.convar,
                server_bound: args.server_bound,
                padding: entry.padding,
                dereferences: entry.dereferences,
            },
        );

        config.save(&entry.config)?;
        self.report_added("convar", &entry.module, &entry.name);
        Ok(())
    }

    fn add_export(&self, args: AddExportArgs) -> anyhow::Result<()> {
        let entry = args.entry;
        let mut config = ScanConfig::load_or_default(&entry.config)?;
        let module = config.module_mut(&entry.module);
        module.remove_entry(&entry.name);
        module.exports.insert(
            entry.name.clone(),
            ExportSpec {
                export: args.export,
                padding: entry.padding,
                dereferences: entry.dereferences,
            },
        );

        config.save(&entry.config)?;
        self.report_added("export", &entry.module, &entry.name);
        Ok(())
    }

    fn report_added(&self, kind: &str, module: &str, name: &str) {
        if !self.quiet {
            println!("{} Added {} {} to {}", "[+]".green(), kind, name.cyan(), module);
        }
    }

    fn show_config(&self, args: ShowArgs) -> anyhow::Result<()> {
        let config = ScanConfig::load(&args.config)
            .with_context(|| format!("Failed to load config {}", args.config.display()))?;

        for (module, spec) in &config.modules {
            println!("{} {} ({})", "[*]".blue(), module, module_stem(module));
            println!(
                "\t{} signatures, {} string searches, {} convars, {} exports",
                spec.signatures.len(),
                spec.string_search.len(),
                spec.convars.len(),
                spec.exports.len()
            );
        }
        println!("{} {} modules, {} entries", "[+]".green(), config.modules.len(), config.entry_count());

        Ok(())
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}
