// inspect / validate / run

use std::path::{Path, PathBuf};

use keybatch_config::Settings;
use keybatch_engine::{
    detect_shape, run, BatchContext, BatchSummary, Dispatcher, Group, Progress, Row, ShapeKind,
};
use keybatch_io::{FileFormat, DEFAULT_EXPORT_FILE};
use serde::Serialize;

use crate::exit_codes::EXIT_BATCH_FAILURES;
use crate::{CliError, RemoteArgs, SelectionArgs};

// ── Input ───────────────────────────────────────────────────────────

/// Read the input rows, mapping failures to the CLI's exit codes.
pub fn load_rows(path: &Path) -> Result<Vec<Row>, CliError> {
    if !path.exists() {
        return Err(CliError::io(format!("{}: file not found", path.display())));
    }
    let format = FileFormat::from_path(path).map_err(|e| {
        CliError::args(e).with_hint("supported inputs: .csv .tsv .xlsx .xls .xlsm .xlsb .ods")
    })?;
    if format == FileFormat::Json {
        return Err(CliError::args(format!(
            "{}: JSON is an export format only",
            path.display()
        ))
        .with_hint("convert the data to CSV or a spreadsheet first"));
    }
    let rows = keybatch_io::read_rows(path).map_err(CliError::parse)?;
    log::debug!("read {} row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

fn context(selection: SelectionArgs, rows: Vec<Row>) -> BatchContext {
    BatchContext::new(selection.operation, rows)
        .with_primary(selection.primary)
        .with_secondary(selection.secondary)
}

fn shape_text(kind: Option<ShapeKind>) -> String {
    match kind {
        Some(kind) => format!("{} ({})", kind.slug(), kind.label()),
        None => "(none)".to_string(),
    }
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// ── inspect ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct InspectReport {
    file: String,
    rows: usize,
    columns: Vec<String>,
    primary: Option<&'static str>,
    secondary: Option<&'static str>,
}

pub fn cmd_inspect(settings: &Settings, input: PathBuf, json: bool) -> Result<(), CliError> {
    let aliases = settings.alias_table().map_err(CliError::config)?;
    let rows = load_rows(&input)?;
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().map(str::to_string).collect())
        .unwrap_or_default();

    let primary = detect_shape(&columns, Group::Primary, &aliases);
    let secondary = detect_shape(&columns, Group::Secondary, &aliases);

    if json {
        return print_json(&InspectReport {
            file: input.display().to_string(),
            rows: rows.len(),
            columns,
            primary: primary.map(ShapeKind::slug),
            secondary: secondary.map(ShapeKind::slug),
        });
    }

    println!("File:       {}", input.display());
    println!("Rows:       {}", rows.len());
    println!("Columns:    {}", columns.join(", "));
    println!("Primary:    {}", shape_text(primary));
    println!("Secondary:  {}", shape_text(secondary));
    Ok(())
}

// ── validate ────────────────────────────────────────────────────────

pub fn cmd_validate(
    settings: &Settings,
    input: PathBuf,
    selection: SelectionArgs,
    json: bool,
) -> Result<(), CliError> {
    let aliases = settings.alias_table().map_err(CliError::config)?;
    let rows = load_rows(&input)?;
    let ctx = context(selection, rows);
    let report = ctx.validate(&aliases);

    if json {
        print_json(&report)?;
    } else if report.valid {
        println!("Operation:  {}", ctx.operation);
        println!("Primary:    {}", shape_text(report.effective.primary));
        if !ctx.operation.is_unary() {
            println!("Secondary:  {}", shape_text(report.effective.secondary));
        }
    }

    match ctx.resolve_shapes(&aliases) {
        Ok(_) => {
            if !json {
                println!("OK: {} row(s) ready", ctx.rows.len());
            }
            Ok(())
        }
        // The JSON report already says what is wrong
        Err(err) if json => Err(CliError { message: String::new(), ..CliError::engine(err) }),
        Err(err) => Err(CliError::engine(err)),
    }
}

// ── run ─────────────────────────────────────────────────────────────

pub struct RunOptions {
    pub input: PathBuf,
    pub selection: SelectionArgs,
    pub output: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub remote: RemoteArgs,
    pub calculator_version: Option<String>,
    pub output_column: Option<String>,
    pub strict: bool,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    output: String,
    operation: String,
    primary: &'static str,
    secondary: Option<&'static str>,
    chunk_size: usize,
    #[serde(flatten)]
    summary: &'a BatchSummary,
}

pub fn cmd_run(settings: &Settings, opts: RunOptions) -> Result<(), CliError> {
    let aliases = settings.alias_table().map_err(CliError::config)?;
    let output_column = opts
        .output_column
        .unwrap_or_else(|| settings.batch.output_column.clone());
    if output_column.trim().is_empty() {
        return Err(CliError::args("--output-column must not be empty"));
    }
    let output = opts
        .output
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    // Reject a bad output extension before any service call
    FileFormat::from_path(&output).map_err(|e| {
        CliError::args(format!("{}: {}", output.display(), e))
            .with_hint("use .xlsx, .csv, .tsv or .json")
    })?;

    let rows = load_rows(&opts.input)?;
    let ctx = context(opts.selection, rows);
    let client = opts.remote.client(settings)?;

    let dispatcher = Dispatcher::new(&client)
        .aliases(&aliases)
        .chunk_size(opts.chunk_size.unwrap_or(settings.batch.chunk_size))
        .retry(settings.retry_policy())
        .calculator_version(
            opts.calculator_version
                .or_else(|| settings.batch.calculator_version.clone()),
        );

    let quiet = opts.quiet || opts.json;
    let on_progress = |p: Progress| {
        if !quiet {
            eprintln!(
                "  {}/{} rows ({:.0}%)",
                p.processed_rows,
                p.total_rows,
                p.percent()
            );
        }
    };

    let batch = run(&ctx, &dispatcher, &output_column, on_progress).map_err(CliError::engine)?;

    keybatch_io::write_records(
        &output,
        &batch.records,
        &batch.headers,
        &settings.batch.sheet_name,
    )
    .map_err(|e| CliError::io(format!("{}: {}", output.display(), e)))?;

    let summary = &batch.summary;
    if opts.json {
        print_json(&RunReport {
            output: output.display().to_string(),
            operation: ctx.operation.to_string(),
            primary: batch.outcome.primary.slug(),
            secondary: batch.outcome.secondary.map(ShapeKind::slug),
            chunk_size: batch.outcome.chunk_size,
            summary,
        })?;
    } else {
        for message in &summary.chunk_error_messages {
            eprintln!("warning: {}", message);
        }
        println!(
            "Processed {} row(s): {} succeeded, {} failed, {} skipped",
            summary.total_rows, summary.succeeded, summary.failed, summary.skipped
        );
        println!("Wrote {}", output.display());
    }

    // Nothing got through: exit with the transport failure
    let chunks = summary.total_rows.div_ceil(batch.outcome.chunk_size);
    if summary.succeeded == 0 && chunks > 0 && summary.chunk_errors == chunks {
        if let Some(last) = batch.outcome.chunk_errors.last() {
            return Err(CliError::transport(&last.last_error, client.api_base()));
        }
    }

    if opts.strict && !summary.is_clean() {
        return Err(CliError {
            code: EXIT_BATCH_FAILURES,
            message: format!(
                "{} row(s) failed, {} skipped",
                summary.failed, summary.skipped
            ),
            hint: None,
        });
    }
    Ok(())
}
