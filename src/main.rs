// Sat Oct 17 2026 - Alex

use colored::Colorize;
use offset_dumper::ui::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{} {}", "[!]".red(), format!("{:#}", e).red());
        std::process::exit(1);
    }
}
