//! Code section loading for commands.

use anyhow::{Context, Result};
use sigoff_core::CodeSection;

use crate::cli::ImageArgs;

/// Load the code section described by the image arguments.
pub fn load_section(args: &ImageArgs, default_section: &str) -> Result<CodeSection> {
    if args.raw {
        let base = args.base.context("--raw requires --base")?;
        let module_base = args.module_base.unwrap_or(base);
        return CodeSection::from_raw_file(&args.image, base, module_base)
            .with_context(|| format!("Failed to load {}", args.image.display()));
    }

    let section = args.section.as_deref().unwrap_or(default_section);
    CodeSection::from_object_file(&args.image, section)
        .with_context(|| format!("Failed to load {} from {}", section, args.image.display()))
}
