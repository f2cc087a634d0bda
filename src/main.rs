mod facets;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;

#[cfg(test)]
#[path = "../tests/src_inline/fixtures.rs"]
mod fixtures;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::facets::search::{DEFAULT_THRESHOLD, search_genes};
use crate::facets::{Facets, extract_facets};
use crate::input::{Dataset, InputError, resolve_resources};
use crate::model::selection::{Selection, SelectionAction};
use crate::model::settings::{DashboardSettings, SettingsError};
use crate::pipeline::stage1_load::load_dataset;
use crate::pipeline::stage3_heatmap::build_heatmaps;
use crate::pipeline::stage4_table::{TableRender, build_table, build_tables};
use crate::pipeline::stage5_export::{
    ExportError, confirm_filename, default_export_name, export_grid, read_export_file,
    write_export_file,
};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    if let Err(err) = run(cli.command) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{0}")]
    Usage(String),
}

#[derive(Debug, Parser)]
#[command(name = "kira-foldchange", version)]
#[command(about = "Explore per-timepoint log2 fold-change data as heatmaps, tables and spreadsheets.")]
struct Cli {
    /// Repeat for more detail (info, debug, trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the option lists of every filter.
    Facets(FacetsArgs),
    /// Write one heatmap figure per timepoint as JSON.
    Heatmap(HeatmapArgs),
    /// Render grouped tables per timepoint.
    Table(TableArgs),
    /// Write one timepoint's table as a CSV spreadsheet.
    Export(ExportArgs),
    /// Fuzzy search over gene ids and names of one group.
    Search(SearchArgs),
    /// Print the normalised shareable query string.
    Query(QueryArgs),
}

#[derive(Debug, Clone, Args)]
struct DataArgs {
    /// Timepoint document (.json or .json.gz); repeatable.
    #[arg(long = "data", value_name = "FILE", help_heading = "Input")]
    data: Vec<PathBuf>,

    /// Directory whose .json/.json.gz files are all loaded.
    #[arg(long = "data-dir", value_name = "DIR", help_heading = "Input")]
    data_dir: Option<PathBuf>,

    /// JSON file overriding dashboard settings.
    #[arg(long = "config", value_name = "FILE", help_heading = "Input")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
struct SelectionArgs {
    /// Shareable URL or bare query string; flags below are applied on top.
    #[arg(long = "query", value_name = "URL", help_heading = "Selection")]
    query: Option<String>,

    #[arg(long = "organelle", value_name = "NAME", help_heading = "Selection")]
    organelle: Option<String>,

    #[arg(long = "genes", value_name = "A,B", value_delimiter = ',', help_heading = "Selection")]
    genes: Option<Vec<String>>,

    /// Adds one gene to the selection; repeatable.
    #[arg(long = "add-gene", value_name = "GENE", help_heading = "Selection")]
    add_genes: Vec<String>,

    /// Removes one gene from the selection; repeatable.
    #[arg(long = "remove-gene", value_name = "GENE", help_heading = "Selection")]
    remove_genes: Vec<String>,

    #[arg(long = "genotypes", value_name = "A,B", value_delimiter = ',', help_heading = "Selection")]
    genotypes: Option<Vec<String>>,

    #[arg(long = "cell-types", value_name = "A,B", value_delimiter = ',', help_heading = "Selection")]
    cell_types: Option<Vec<String>>,

    #[arg(long = "tp-range", value_name = "LO,HI", help_heading = "Selection")]
    tp_range: Option<String>,

    /// Start from the default selection instead of --query.
    #[arg(long = "reset", conflicts_with = "query", help_heading = "Selection")]
    reset: bool,
}

#[derive(Debug, Clone, Args)]
struct FacetsArgs {
    #[command(flatten)]
    data: DataArgs,

    #[arg(long = "json")]
    json: bool,

    /// Print each gene's description under it.
    #[arg(long = "describe", conflicts_with = "json")]
    describe: bool,
}

#[derive(Debug, Clone, Args)]
struct HeatmapArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Output file; stdout when omitted.
    #[arg(long = "out", value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TableFormat {
    Html,
    Text,
}

#[derive(Debug, Clone, Args)]
struct TableArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    #[arg(long = "format", value_enum, default_value_t = TableFormat::Text)]
    format: TableFormat,

    #[arg(long = "out", value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ExportArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Timepoint label; defaults to the first one in the selected range.
    #[arg(long = "timepoint", value_name = "LABEL")]
    timepoint: Option<String>,

    /// Exact output path; overrides --out-dir and the default name.
    #[arg(long = "out", value_name = "FILE", conflicts_with = "confirm")]
    out: Option<PathBuf>,

    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Prompt for the file name on stdin.
    #[arg(long = "confirm")]
    confirm: bool,
}

#[derive(Debug, Clone, Args)]
struct SearchArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Group to search; the first group when omitted.
    #[arg(long = "organelle", value_name = "NAME")]
    organelle: Option<String>,

    #[arg(long = "threshold", value_name = "F", default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    #[arg(long = "json")]
    json: bool,

    /// Print each hit's description under it.
    #[arg(long = "describe", conflicts_with = "json")]
    describe: bool,

    query: String,
}

#[derive(Debug, Clone, Args)]
struct QueryArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    selection: SelectionArgs,
}

struct Loaded {
    settings: DashboardSettings,
    dataset: Dataset,
    facets: Facets,
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Facets(args) => {
            let loaded = load(&args.data)?;
            let text = if args.json {
                serde_json::to_string_pretty(&loaded.facets)?
            } else {
                report::text::render_facets_text(&loaded.facets, args.describe)
            };
            write_output(None, &text)
        }
        Command::Heatmap(args) => {
            let loaded = load(&args.data)?;
            let selection = resolve_selection(&args.selection, &loaded.facets, &loaded.settings)?;
            let renders = build_heatmaps(&loaded.dataset, &selection, &loaded.settings);
            let text = report::json::render_figures_json(&renders, &loaded.settings);
            write_output(args.out.as_deref(), &text)
        }
        Command::Table(args) => {
            let loaded = load(&args.data)?;
            let selection = resolve_selection(&args.selection, &loaded.facets, &loaded.settings)?;
            let renders = build_tables(&loaded.dataset, &selection, &loaded.settings);
            let text = match args.format {
                TableFormat::Text => report::text::render_tables_text(&renders),
                TableFormat::Html => {
                    let title = format!(
                        "{} log2 fold change",
                        selection.group.as_deref().unwrap_or("")
                    );
                    report::html::render_tables_html(&renders, title.trim())
                }
            };
            write_output(args.out.as_deref(), &text)
        }
        Command::Export(args) => {
            let path = run_export(&args, std::io::stdin().lock(), std::io::stderr())?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Search(args) => {
            let loaded = load(&args.data)?;
            let group = match args.organelle {
                Some(g) => g,
                None => loaded.facets.groups.first().cloned().ok_or_else(|| {
                    CliError::Usage("dataset has no organelle/gene lists".to_string())
                })?,
            };
            if !loaded.facets.has_group(&group) {
                return Err(CliError::Usage(format!("unknown organelle/gene list: {group}")));
            }
            let hits = search_genes(&loaded.facets, &group, &args.query, args.threshold);
            let text = if args.json {
                serde_json::to_string_pretty(&hits)?
            } else {
                report::text::render_search_text(&hits, args.describe)
            };
            write_output(None, &text)
        }
        Command::Query(args) => {
            let loaded = load(&args.data)?;
            let selection = resolve_selection(&args.selection, &loaded.facets, &loaded.settings)?;
            write_output(None, &format!("?{}\n", selection.to_query()))
        }
    }
}

fn load(args: &DataArgs) -> Result<Loaded, CliError> {
    let settings = match &args.config {
        Some(path) => DashboardSettings::load(path)?,
        None => DashboardSettings::default_v1(),
    };
    let resources = resolve_resources(&args.data, args.data_dir.as_deref())?;
    let dataset = load_dataset(&resources, &settings)?;
    let facets = extract_facets(&dataset);
    tracing::info!(
        sources = dataset.sources.len(),
        timepoints = dataset.timepoints.len(),
        groups = facets.groups.len(),
        "dataset ready"
    );
    tracing::debug!(hours = ?dataset.timepoint_values(), "timepoint values");
    Ok(Loaded {
        settings,
        dataset,
        facets,
    })
}

/// Query string first, then each explicit flag as a reducer action.
fn resolve_selection(
    args: &SelectionArgs,
    facets: &Facets,
    settings: &DashboardSettings,
) -> Result<Selection, CliError> {
    let outcome = Selection::from_query(args.query.as_deref().unwrap_or(""), facets, settings);
    tracing::debug!(ignored = outcome.warnings.len(), "query applied");
    let mut selection = outcome.selection;

    if args.reset {
        apply_action(&mut selection, SelectionAction::Reset, facets, settings);
    }
    if let Some(group) = &args.organelle {
        let accepted = apply_action(
            &mut selection,
            SelectionAction::SelectGroup(group.clone()),
            facets,
            settings,
        );
        if accepted && args.genes.is_none() {
            let first = facets.gene_options(group).first().cloned();
            apply_action(
                &mut selection,
                SelectionAction::SetGenes(first.into_iter().collect()),
                facets,
                settings,
            );
        }
    }

    let mut actions = Vec::new();
    if let Some(genes) = &args.genes {
        actions.push(SelectionAction::SetGenes(genes.clone()));
    }
    for gene in &args.add_genes {
        actions.push(SelectionAction::AddGene(gene.clone()));
    }
    for gene in &args.remove_genes {
        actions.push(SelectionAction::RemoveGene(gene.clone()));
    }
    if let Some(genotypes) = &args.genotypes {
        actions.push(SelectionAction::SetGenotypes(genotypes.clone()));
    }
    if let Some(cell_types) = &args.cell_types {
        actions.push(SelectionAction::SetCellTypes(cell_types.clone()));
    }
    if let Some(raw) = &args.tp_range {
        let (lo, hi) = parse_tp_range(raw)?;
        actions.push(SelectionAction::SetTimepointRange(lo, hi));
    }
    for action in actions {
        apply_action(&mut selection, action, facets, settings);
    }
    if selection.is_empty() {
        tracing::warn!("selection is empty; every render will be an empty state");
    }
    tracing::debug!(query = %selection.to_query(), "selection resolved");
    Ok(selection)
}

/// Returns whether the action was accepted; a rejected one leaves
/// `selection` untouched.
fn apply_action(
    selection: &mut Selection,
    action: SelectionAction,
    facets: &Facets,
    settings: &DashboardSettings,
) -> bool {
    let transition = selection.apply(action, facets, settings);
    *selection = transition.selection;
    match &transition.warning {
        Some(warning) => {
            tracing::warn!(%warning, "selection change rejected");
            false
        }
        None => true,
    }
}

fn parse_tp_range(raw: &str) -> Result<(f64, f64), CliError> {
    let usage = || CliError::Usage(format!("invalid --tp-range {raw:?} (use LO,HI in hours)"));
    let (lo, hi) = raw.split_once(',').ok_or_else(usage)?;
    let lo: f64 = lo.trim().parse().map_err(|_| usage())?;
    let hi: f64 = hi.trim().parse().map_err(|_| usage())?;
    Ok((lo, hi))
}

fn run_export<R: std::io::BufRead, W: Write>(
    args: &ExportArgs,
    input: R,
    prompt: W,
) -> Result<PathBuf, CliError> {
    let loaded = load(&args.data)?;
    let selection = resolve_selection(&args.selection, &loaded.facets, &loaded.settings)?;

    let label = match &args.timepoint {
        Some(label) => loaded
            .dataset
            .timepoint(label)
            .map(|t| t.label.clone())
            .ok_or_else(|| CliError::Usage(format!("unknown timepoint: {label}")))?,
        None => selection
            .timepoints_in_range(&loaded.dataset.timepoints)
            .first()
            .map(|t| t.label.clone())
            .ok_or_else(|| CliError::Usage("no timepoint in the selected range".to_string()))?,
    };

    let table = match build_table(
        loaded.dataset.tree(&label),
        &label,
        &selection,
        &loaded.settings,
    ) {
        TableRender::Ready(table) => table,
        TableRender::Empty { reason, .. } => {
            return Err(CliError::Usage(format!(
                "nothing to export for {label}: {}",
                reason.message()
            )));
        }
    };
    let grid = export_grid(&table, &loaded.settings);

    let path = match &args.out {
        Some(path) => path.clone(),
        None => {
            let mut name = default_export_name(&label, &chrono::Local::now());
            if args.confirm {
                name = confirm_filename(&name, input, prompt).map_err(|source| CliError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            }
            args.out_dir
                .as_deref()
                .unwrap_or_else(|| Path::new("."))
                .join(name)
        }
    };
    write_export_file(&grid, &path)?;
    if read_export_file(&path)? != grid {
        return Err(ExportError::Format(format!(
            "{} does not read back as the exported table",
            path.display()
        ))
        .into());
    }
    Ok(path)
}

fn write_output(out: Option<&Path>, text: &str) -> Result<(), CliError> {
    match out {
        Some(path) => {
            std::fs::write(path, text).map_err(|source| CliError::Io {
                path: path.display().to_string(),
                source,
            })?;
            tracing::info!(path = %path.display(), "output written");
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| {
                    if text.ends_with('\n') {
                        Ok(())
                    } else {
                        stdout.write_all(b"\n")
                    }
                })
                .map_err(|source| CliError::Io {
                    path: "<stdout>".to_string(),
                    source,
                })
        }
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
