//! End-to-end generation: load the package, extract call sites, render and
//! write the table.

use crate::analysis::extract_callsites;
use crate::cli::{Cli, OutputFormat};
use crate::codegen::{self, RenderOptions};
use crate::loader;
use crate::profile::Profile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory holding the package dump
    pub directory: PathBuf,
    /// Output path; `None` uses the format's default file name inside `directory`
    pub output_file: Option<PathBuf>,
    pub var_name: String,
    /// Package name for the output; `None` uses the dumped package's name
    pub package_name: Option<String>,
    pub format: OutputFormat,
    pub details_type: String,
    /// Profile file; `None` uses the built-in emitter profile
    pub profile: Option<PathBuf>,
}

impl GeneratorConfig {
    /// Configuration with default output settings for `directory`
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        let defaults = RenderOptions::default();
        Self {
            directory: directory.into(),
            output_file: None,
            var_name: defaults.var_name,
            package_name: None,
            format: defaults.format,
            details_type: defaults.details_type,
            profile: None,
        }
    }

    /// Where the output goes: bare file names land inside the scanned
    /// directory, anything with a directory component is used as given
    pub fn output_path(&self) -> PathBuf {
        let output = self
            .output_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.format.default_file_name()));
        if output == Path::new("-") || output.is_absolute() {
            return output;
        }
        let bare = output
            .parent()
            .map_or(true, |parent| parent.as_os_str().is_empty());
        if bare {
            self.directory.join(output)
        } else {
            output
        }
    }
}

impl From<&Cli> for GeneratorConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            directory: cli.directory.clone(),
            output_file: cli.output.clone(),
            var_name: cli.var_name.clone(),
            package_name: cli.package_name.clone(),
            format: cli.format,
            details_type: cli.details_type.clone(),
            profile: cli.profile.clone(),
        }
    }
}

/// What a generation run produced
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub package: String,
    pub output: PathBuf,
    pub callsites: usize,
}

pub fn generate(config: &GeneratorConfig) -> Result<GenerationReport> {
    let profile = match &config.profile {
        Some(path) => Profile::from_file(path)?,
        None => Profile::default(),
    };

    let package = loader::load_package(&config.directory).context("loading package")?;
    let callsites = extract_callsites(&package, &profile).context("extracting call sites")?;
    tracing::debug!(
        package = %package.path,
        callsites = callsites.len(),
        "call sites extracted"
    );

    let options = RenderOptions {
        format: config.format,
        var_name: config.var_name.clone(),
        package_name: config
            .package_name
            .clone()
            .unwrap_or_else(|| package.name.clone()),
        details_type: config.details_type.clone(),
    };
    let rendered = codegen::render(&callsites, &options)?;

    let output = config.output_path();
    codegen::write_output(&output, &rendered).context("writing output")?;

    Ok(GenerationReport {
        package: package.path,
        output,
        callsites: callsites.len(),
    })
}
