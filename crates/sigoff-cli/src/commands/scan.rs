//! Scan command implementation.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use sigoff_core::{CodeSection, MaskedMatcher, Pattern, rel32_target};

use super::image::load_section;
use super::update::load_config;
use crate::cli::ScanArgs;

/// Run the scan command
pub fn run(args: ScanArgs, config_path: &std::path::Path) -> Result<()> {
    let config = load_config(config_path)?;
    let section = load_section(&args.image, &config.section)?;

    let pattern = Pattern::parse(&args.signature)
        .with_context(|| format!("Invalid signature {:?}", args.signature))?;

    println!(
        "Scanning {:#x} bytes at 0x{:X} (module base 0x{:X}) for {}",
        section.len(),
        section.base_address(),
        section.module_base(),
        pattern
    );

    let matches = MaskedMatcher::new(&pattern).find_all(section.bytes());
    for line in describe_matches(&section, &matches, args.indirect, args.limit) {
        println!("  {}", line);
    }
    if matches.len() > args.limit {
        println!("  ... ({} more)", matches.len() - args.limit);
    }

    println!();
    match matches.len() {
        0 => println!("{}", "No matches".red()),
        1 => println!("{}", "1 match (unique)".green()),
        n => println!("{}", format!("{} matches (ambiguous)", n).yellow()),
    }

    Ok(())
}

/// One line per match: section offset, module offset and absolute address.
pub fn describe_matches(
    section: &CodeSection,
    matches: &[usize],
    indirect: bool,
    limit: usize,
) -> Vec<String> {
    matches
        .iter()
        .take(limit)
        .map(|&offset| {
            let address = section.address_of(offset);
            let mut line = format!(
                "section+0x{:X}  module+0x{:X}  0x{:X}",
                offset,
                address.wrapping_sub(section.module_base()),
                address
            );
            if indirect {
                match rel32_target(section, offset) {
                    Ok(target) => line.push_str(&format!(
                        "  -> module+0x{:X} (0x{:X})",
                        target.wrapping_sub(section.module_base()),
                        target
                    )),
                    Err(e) => line.push_str(&format!("  -> {}", e)),
                }
            }
            line
        })
        .collect()
}
