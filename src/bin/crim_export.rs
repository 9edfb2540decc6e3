use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crim_viewer::config::ViewerConfig;
use crim_viewer::data::filter::{filter_by_field, project, resolve_selection, value_counts};
use crim_viewer::data::loader::load_file;
use crim_viewer::data::model::Field;
use crim_viewer::data::source::{HttpSource, RelationshipSource};
use crim_viewer::export::{encode_csv, Exporter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dimension {
    RelationshipType,
    MusicalType,
    Model,
    Derivative,
}

impl From<Dimension> for Field {
    fn from(d: Dimension) -> Self {
        match d {
            Dimension::RelationshipType => Field::RelationshipType,
            Dimension::MusicalType => Field::MusicalType,
            Dimension::Model => Field::ModelPiece,
            Dimension::Derivative => Field::DerivativePiece,
        }
    }
}

/// Fetch CRIM relationships, filter them by one dimension and export CSV.
#[derive(Debug, Parser)]
#[command(name = "crim-export", version)]
struct Args {
    /// Relationships endpoint (overrides CRIM_DATA_URL)
    #[arg(long, env = "CRIM_DATA_URL")]
    url: Option<String>,

    /// Read a local .json or .csv snapshot instead of fetching
    #[arg(long)]
    input: Option<PathBuf>,

    /// Dimension to filter on; omit to export every row
    #[arg(long, value_enum)]
    field: Option<Dimension>,

    /// Accepted value as it appears in exported CSV (repeatable); pass an
    /// empty value to select rows where the field is missing
    #[arg(long)]
    value: Vec<String>,

    /// Keep every flattened column instead of the six known ones
    #[arg(long)]
    all_columns: bool,

    /// Print value counts for the dimension as JSON instead of CSV
    #[arg(long, requires = "field", conflicts_with = "value")]
    counts: bool,

    /// Write CSV here instead of stdout
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Print an HTML download link suggesting this filename instead of raw CSV
    #[arg(long)]
    link: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = ViewerConfig::load_with_data_url(args.url.as_deref()).context("loading configuration")?;

    let table = match &args.input {
        Some(path) => load_file(path)?,
        None => HttpSource::from_config(&config)?
            .fetch_relationships()
            .with_context(|| format!("fetching {}", config.data_url))?,
    };

    if args.counts {
        let field: Field = args.field.context("--counts needs --field")?.into();
        let counts = value_counts(&table, field.column())?;
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    let mut subset = if args.all_columns {
        table
    } else {
        project(&table, &Field::ALL)?
    };

    if let Some(dimension) = args.field {
        let field: Field = dimension.into();
        let accepted = resolve_selection(&subset, field.column(), args.value.as_slice())?;
        subset = filter_by_field(&subset, field, &accepted)?;
    }
    log::info!("Exporting {} rows", subset.len());

    let bytes = encode_csv(&subset)?;
    let output = match &args.link {
        Some(filename) => {
            let link = Exporter::new(&config.export_mime).to_download_link(&bytes, filename, &config.link_text);
            if let Some(warning) = &link.warning {
                log::warn!("{warning}");
            }
            format!("{}\n", link.to_html()).into_bytes()
        }
        None => bytes,
    };

    match &args.out {
        Some(path) => std::fs::write(path, &output)
            .with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout().write_all(&output)?,
    }
    Ok(())
}
