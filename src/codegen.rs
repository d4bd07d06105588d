//! Call-site table rendering
//!
//! Renders a [`CallSiteMap`] as a Rust source file (a static lookup table)
//! or as a JSON document. Entries are always ordered by file name and line
//! so regenerating an unchanged package produces identical output.

use crate::analysis::{CallSite, CallSiteMap};
use crate::cli::OutputFormat;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

/// First line of every generated Rust file
pub const GENERATED_HEADER: &str = "// Code generated by emitgen. DO NOT EDIT.";

/// Default path of the details type used by generated Rust tables
pub const DEFAULT_DETAILS_TYPE: &str = "emitter::types::CallSiteDetails";

/// Default name of the generated table
pub const DEFAULT_VAR_NAME: &str = "EMITTER_CALLSITE_DETAILS";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub var_name: String,
    pub package_name: String,
    /// Path of the details struct (`emitter::types::CallSiteDetails`)
    pub details_type: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Rust,
            var_name: DEFAULT_VAR_NAME.to_string(),
            package_name: String::new(),
            details_type: DEFAULT_DETAILS_TYPE.to_string(),
        }
    }
}

fn check_identifier(kind: &str, value: &str) -> Result<()> {
    let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")?;
    if !ident.is_match(value) {
        bail!("Invalid {} {:?}: must be an identifier", kind, value);
    }
    Ok(())
}

fn check_type_path(value: &str) -> Result<()> {
    let path = Regex::new(r"^(::)?[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")?;
    if !path.is_match(value) {
        bail!("Invalid details type {:?}: must be a type path", value);
    }
    Ok(())
}

/// Render the call-site table
pub fn render(callsites: &CallSiteMap, options: &RenderOptions) -> Result<String> {
    check_identifier("variable name", &options.var_name)?;
    check_identifier("package name", &options.package_name)?;

    match options.format {
        OutputFormat::Rust => {
            check_type_path(&options.details_type)?;
            Ok(render_rust(callsites, options))
        }
        OutputFormat::Json => render_json(callsites, options),
    }
}

fn render_rust(callsites: &CallSiteMap, options: &RenderOptions) -> String {
    let details = options
        .details_type
        .rsplit("::")
        .next()
        .unwrap_or(&options.details_type);
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{GENERATED_HEADER}");
    let _ = writeln!(out, "// Package: {}", options.package_name);
    out.push('\n');
    if options.details_type.contains("::") {
        let _ = writeln!(out, "use {};", options.details_type);
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "pub static {}: &[(&str, {})] = &[",
        options.var_name, details
    );
    for site in callsites.sorted() {
        write_entry(&mut out, details, site);
    }
    out.push_str("];\n");
    out
}

fn write_entry(out: &mut String, details: &str, site: &CallSite) {
    let keys = site
        .property_keys
        .iter()
        .map(|k| format!("{k:?}"))
        .collect::<Vec<_>>()
        .join(", ");

    let _ = writeln!(out, "    (");
    let _ = writeln!(out, "        {:?},", site.event_name);
    let _ = writeln!(out, "        {details} {{");
    let _ = writeln!(out, "            filename: {:?},", site.filename);
    let _ = writeln!(out, "            line_no: {},", site.line_no);
    let _ = writeln!(out, "            func_name: {:?},", site.func_name);
    let _ = writeln!(out, "            package: {:?},", site.package);
    let _ = writeln!(out, "            property_keys: &[{keys}],");
    let _ = writeln!(out, "            metric_type: {:?},", site.metric_type);
    let _ = writeln!(out, "        }},");
    let _ = writeln!(out, "    ),");
}

#[derive(Serialize)]
struct JsonTable<'a> {
    package: &'a str,
    variable: &'a str,
    callsites: Vec<&'a CallSite>,
}

fn render_json(callsites: &CallSiteMap, options: &RenderOptions) -> Result<String> {
    let table = JsonTable {
        package: &options.package_name,
        variable: &options.var_name,
        callsites: callsites.sorted(),
    };
    let mut json = serde_json::to_string_pretty(&table).context("Failed to serialize call sites")?;
    json.push('\n');
    Ok(json)
}

/// Write rendered output; `-` writes to stdout
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    if path == Path::new("-") {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(contents.as_bytes())
            .context("Failed to write to stdout")?;
        return stdout.flush().context("Failed to write to stdout");
    }

    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))
}
