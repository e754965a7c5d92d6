//! Config command implementation

use std::fmt::Write;

use miette::{IntoDiagnostic, Result};
use tsuzufmt_core::config::{OPTIONS, Origin, load_config};
use tsuzufmt_core::{Config, FsDiscovery};

use crate::cli::{Cli, Overrides};

pub fn run_config(cli: &Cli, default: bool) -> Result<()> {
    if default {
        print!("{}", render_jsonc(&Config::default(), false));
        return Ok(());
    }

    let cwd = std::env::current_dir().into_diagnostic()?;
    let options = Overrides::new(cli, None);
    let (config, path) = load_config(&cwd, &options, &FsDiscovery::new()).into_diagnostic()?;

    if let Some(path) = path {
        println!("// {}", path.display());
    }
    print!("{}", render_jsonc(&config, false));
    Ok(())
}

/// Renders `config` as JSONC in option-table order.
///
/// With `stable_only`, unstable options are left out so the text can be used
/// as a config file without `unstable_features`.
pub fn render_jsonc(config: &Config, stable_only: bool) -> String {
    let specs: Vec<_> = OPTIONS
        .iter()
        .filter(|spec| spec.stable || !stable_only)
        .collect();

    let mut out = String::from("{\n");
    for (i, spec) in specs.iter().enumerate() {
        let Some(value) = config.get(spec.name) else {
            continue;
        };
        let origin = config.origin(spec.name).unwrap_or(Origin::Default);
        let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
        let comma = if i + 1 < specs.len() { "," } else { "" };

        let _ = writeln!(out, "  // {}", spec.doc);
        if origin == Origin::Default {
            let _ = writeln!(out, "  \"{}\": {}{}", spec.name, json, comma);
        } else {
            let _ = writeln!(out, "  \"{}\": {}{} // from {}", spec.name, json, comma, origin);
        }
    }
    out.push_str("}\n");
    out
}
