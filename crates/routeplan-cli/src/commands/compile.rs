use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use routeplan_compiler::{Compilation, GroupCompiler};
use routeplan_core::{RouteplanConfig, Snapshot};

pub fn compile(snapshot: &str, config: Option<&str>, format: &str) -> anyhow::Result<()> {
    let compilation = run(snapshot, config)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&compilation)?);
        }
        _ => {
            print!("{}", format_table(&compilation));
        }
    }

    Ok(())
}

pub fn check(snapshot: &str, config: Option<&str>, deny_warnings: bool) -> anyhow::Result<()> {
    let compilation = run(snapshot, config)?;

    for warning in &compilation.warnings {
        println!("warning: {warning}");
    }
    let stats = compilation.stats();
    println!(
        "✓ {} mappings in {} groups, {} warnings",
        stats.mappings, stats.groups, stats.warnings
    );

    if deny_warnings && !compilation.warnings.is_empty() {
        anyhow::bail!("{} warnings (--deny-warnings)", compilation.warnings.len());
    }
    Ok(())
}

fn run(snapshot: &str, config: Option<&str>) -> anyhow::Result<Compilation> {
    let config = match config {
        Some(path) => RouteplanConfig::from_file(Path::new(path))
            .with_context(|| format!("loading config {path}"))?,
        None => RouteplanConfig::default(),
    };
    let snapshot = Snapshot::from_file(Path::new(snapshot))
        .with_context(|| format!("loading snapshot {snapshot}"))?;

    let compiler = GroupCompiler::from_config(&config)?;
    let compilation = compiler
        .compile(&snapshot)
        .context("route compilation failed; no table emitted")?;
    Ok(compilation)
}

/// Render a compilation as a human-readable listing.
fn format_table(compilation: &Compilation) -> String {
    let mut out = String::new();

    for (i, group) in compilation.table.groups.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {} [{}]", i + 1, group.label, &group.group_id[..12]);
        for member in &group.members {
            let weight = member
                .canary_weight
                .map(|w| format!("{w:>3}%"))
                .unwrap_or_else(|| "   -".to_string());
            let tls = member
                .tls_context
                .as_deref()
                .map(|ctx| format!(" tls={ctx}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "     {weight} {} -> {}{tls}",
                member.resource_key(),
                member.mapping.service
            );
        }
        if let Some(shadow) = &group.shadow {
            let _ = writeln!(
                out,
                "     shadow {}% {} -> {}",
                shadow.canary_weight.unwrap_or(0),
                shadow.resource_key(),
                shadow.mapping.service
            );
        }
    }

    for warning in &compilation.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}
