//! Configuration display

use lumin_core::{Config, Secrets};

use super::Context;

/// Print the effective configuration
pub fn show(ctx: &Context) {
    let config = &ctx.config;

    println!("LUMIN Configuration");
    println!("===================");
    println!();
    println!("GitHub:");
    println!("  owner: {}", config.github.owner);
    println!("  repo: {}", config.github.repo);
    println!("  project: {}", config.github.project);
    println!("  token: {}", if ctx.token().is_ok() { "(set)" } else { "(not set)" });
    println!();
    println!("Automation:");
    println!("  delay: {:?}", config.automation.delay);
    println!("  since_issue: {}", config.automation.since_issue);
    println!();
    println!("Taxonomy:");
    let names = |defs: &[lumin_core::LabelDef]| {
        defs.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(", ")
    };
    println!("  tracks: {}", names(&config.taxonomy.tracks));
    println!("  priorities: {}", names(&config.taxonomy.priorities));
    println!("  allowed: {}", names(&config.taxonomy.allowed));
    println!();

    for (what, path) in [
        ("Config file", Config::default_config_path()),
        ("Secrets file", Secrets::default_secrets_path()),
    ] {
        if let Some(path) = path {
            println!("{}: {}", what, path.display());
            if path.exists() {
                println!("  (exists)");
            } else {
                println!("  (not found - using defaults)");
            }
        }
    }
}
