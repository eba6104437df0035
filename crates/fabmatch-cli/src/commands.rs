//! Subcommands.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use fabmatch_core::DEFAULT_NAME_SUFFIX;
use fabmatch_io::{ElementKind, IfcReadOptions};
use fabmatch_match::engine::DEFAULT_TIE_TOLERANCE;
use fabmatch_match::{reconcile, MatchOptions, NameKeySource};
use tracing::info;

/// Status printed by commands that produce files.
pub const SUCCESS: &str = "Success";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract structural elements from an IFC model into JSON
    ParseIfc(ParseIfcCommand),

    /// Extract parts from an assembly XML file into JSON
    ParseXml(ParseXmlCommand),

    /// Match extracted elements to parts and export JSON and CSV results
    Match(MatchCommand),

    /// Copy a reviewed CSV into a folder together with a JSON rendering
    Finalize(FinalizeCommand),
}

impl Command {
    pub fn execute(&self) -> Result<String> {
        match self {
            Command::ParseIfc(cmd) => cmd.execute(),
            Command::ParseXml(cmd) => cmd.execute(),
            Command::Match(cmd) => cmd.execute(),
            Command::Finalize(cmd) => cmd.execute(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ParseIfcCommand {
    /// IFC model to read
    pub ifc: PathBuf,

    /// Output JSON file
    pub out_json: PathBuf,

    /// Element kind to extract, repeatable (e.g. IfcBeam). Default: all
    #[arg(long = "kind", value_parser = parse_kind)]
    pub kinds: Vec<ElementKind>,
}

impl ParseIfcCommand {
    pub fn execute(&self) -> Result<String> {
        let options = if self.kinds.is_empty() {
            IfcReadOptions::default()
        } else {
            IfcReadOptions::new().with_kinds(self.kinds.iter().copied())
        };

        let entities = fabmatch_io::extract_entities(&self.ifc, &options)
            .with_context(|| format!("failed to open IFC file {}", self.ifc.display()))?;
        fabmatch_io::save_records(&self.out_json, &entities)
            .with_context(|| format!("failed to write {}", self.out_json.display()))?;

        info!(
            entities = entities.len(),
            out = %self.out_json.display(),
            "IFC extraction complete"
        );
        Ok(SUCCESS.to_string())
    }
}

fn parse_kind(name: &str) -> Result<ElementKind, String> {
    ElementKind::from_ifc_name(name).ok_or_else(|| {
        let known: Vec<_> = ElementKind::ALL.iter().map(|k| k.ifc_name()).collect();
        format!("unknown element kind `{name}`, expected one of {}", known.join(", "))
    })
}

#[derive(Debug, Args)]
pub struct ParseXmlCommand {
    /// Assembly XML file to read
    pub xml: PathBuf,

    /// Output JSON file
    pub out_json: PathBuf,
}

impl ParseXmlCommand {
    pub fn execute(&self) -> Result<String> {
        let parts = fabmatch_io::extract_parts(&self.xml)
            .with_context(|| format!("failed to parse assembly XML {}", self.xml.display()))?;
        fabmatch_io::save_records(&self.out_json, &parts)
            .with_context(|| format!("failed to write {}", self.out_json.display()))?;

        info!(parts = parts.len(), out = %self.out_json.display(), "XML extraction complete");
        Ok(SUCCESS.to_string())
    }
}

#[derive(Debug, Args)]
pub struct MatchCommand {
    /// Entity records written by `parse-ifc`
    #[arg(long)]
    pub ifc_json: PathBuf,

    /// Part records written by `parse-xml`
    #[arg(long)]
    pub xml_json: PathBuf,

    /// Output JSON results
    #[arg(long)]
    pub out_json: PathBuf,

    /// Output CSV review table
    #[arg(long)]
    pub out_csv: PathBuf,

    /// Property set holding the name key (e.g. "+Träger")
    #[arg(long)]
    pub property_set: String,

    /// Property key holding the name key (e.g. "Position")
    #[arg(long)]
    pub property_key: String,

    /// Appended to the property value to form the name key
    #[arg(long, default_value = DEFAULT_NAME_SUFFIX)]
    pub suffix: String,

    /// Costs within this distance of the chosen cost flag a manual check
    #[arg(long, default_value_t = DEFAULT_TIE_TOLERANCE, value_parser = parse_tolerance)]
    pub tie_tolerance: f64,
}

impl MatchCommand {
    pub fn execute(&self) -> Result<String> {
        let entities = fabmatch_io::load_entities(&self.ifc_json)
            .with_context(|| format!("failed to load {}", self.ifc_json.display()))?;
        let parts = fabmatch_io::load_parts(&self.xml_json)
            .with_context(|| format!("failed to load {}", self.xml_json.display()))?;

        let source = NameKeySource::new(&self.property_set, &self.property_key)
            .with_suffix(&self.suffix);
        let options = MatchOptions {
            tie_tolerance: self.tie_tolerance,
            ..MatchOptions::default()
        };

        let outcome = reconcile(&entities, &parts, &source, &options);

        fabmatch_export::export_results(&self.out_json, &self.out_csv, &outcome.records)
            .context("failed to export match results")?;

        Ok(outcome.summary.to_string())
    }
}

fn parse_tolerance(value: &str) -> Result<f64, String> {
    let tolerance: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(tolerance)
    } else {
        Err("tolerance must be a finite, non-negative number".to_string())
    }
}

#[derive(Debug, Args)]
pub struct FinalizeCommand {
    /// Reviewed CSV file
    pub csv: PathBuf,

    /// Folder receiving the CSV copy and its JSON rendering
    pub out_dir: PathBuf,
}

impl FinalizeCommand {
    pub fn execute(&self) -> Result<String> {
        let result = fabmatch_export::finalize_review(&self.csv, &self.out_dir)
            .with_context(|| format!("failed to finalize {}", self.csv.display()))?;

        info!(
            csv = %result.csv_path.display(),
            json = %result.json_path.display(),
            "review published"
        );
        Ok(SUCCESS.to_string())
    }
}
