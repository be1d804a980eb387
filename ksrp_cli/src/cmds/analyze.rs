/* Analyze command - print frame layouts without writing output */

use crate::config::Settings;
use anyhow::Context;
use ksrp_gen::protocol::Protocol;
use ksrp_gen::Compiler;
use std::fmt::{self, Write};

/* Execute the analyze command */
pub fn run(settings: &Settings, print_ir: bool) -> anyhow::Result<()> {
    println!("KSRP Compiler - Layout Analysis Tool");
    println!("====================================\n");

    let compiler = Compiler::new(settings.options.clone())?;

    println!("[~] Loading protocol documents from {}...", settings.source_dir.display());
    let documents = compiler
        .load_dir(&settings.source_dir)
        .with_context(|| format!("Failed to load protocols from {}", settings.source_dir.display()))?;

    let protocols = compiler.build(&documents).context("Layout computation failed")?;
    compiler.view(&protocols).context("Symbol check failed")?;
    println!("[~] Built {} protocol(s)\n", protocols.len());

    for protocol in &protocols {
        print!("{}", layout_table(protocol)?);
    }

    if print_ir {
        println!("[~] Layout IR:");
        println!("{}", serde_json::to_string_pretty(&protocols)?);
    }

    println!("[✓] Analysis complete");
    Ok(())
}

/* One block per subsystem: a header line, then a table per frame */
fn layout_table(protocol: &Protocol) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let device = if protocol.multi_device { ", multi-device" } else { "" };
    writeln!(
        out,
        "Subsystem '{}' (id {}{})",
        protocol.subsystem, protocol.subsystem_id, device
    )?;

    for frame in &protocol.frames {
        writeln!(
            out,
            "  Frame '{}' (id {}, {} bytes)",
            frame.name,
            frame.id,
            frame.size()
        )?;
        writeln!(
            out,
            "    {:<24} {:<10} {:<10} {:>6} {:>6}",
            "field", "declared", "storage", "offset", "width"
        )?;
        for field in &frame.fields {
            writeln!(
                out,
                "    {:<24} {:<10} {:<10} {:>6} {:>6}",
                field.name, field.declared_type, field.storage_type, field.offset, field.width
            )?;
        }
    }
    out.push('\n');
    Ok(out)
}
