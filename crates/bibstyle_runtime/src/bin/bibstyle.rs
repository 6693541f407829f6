//! Bibstyle CLI entry point.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bibstyle_engine::{EntryValidator, ValidationConfig};
use bibstyle_foundation::{Diagnostics, Severity};
use bibstyle_runtime::{StyleRegistry, load_config, load_entries, load_template, save_template};
use bibstyle_stdlib::DEFAULT_STYLE_NAME;
use tracing_subscriber::EnvFilter;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    schemas: Vec<PathBuf>,
    config: Option<PathBuf>,
    style: Option<String>,
    strict_dates: bool,
    compile_template: Option<(PathBuf, PathBuf)>,
    entry_files: Vec<PathBuf>,
    show_help: bool,
    show_version: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::from(2)
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();
    let mut args = args.into_iter().skip(1);

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} requires a value"));
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--strict-dates" => config.strict_dates = true,
            "--schema" => config.schemas.push(PathBuf::from(value("--schema")?)),
            "--config" => config.config = Some(PathBuf::from(value("--config")?)),
            "--style" => config.style = Some(value("--style")?),
            "--compile-template" => {
                let input = PathBuf::from(value("--compile-template")?);
                let output = PathBuf::from(value("--compile-template")?);
                config.compile_template = Some((input, output));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.entry_files.push(PathBuf::from(path)),
        }
    }

    Ok(config)
}

/// Returns `Ok(true)` when nothing was reported.
fn run(args: Vec<String>) -> Result<bool, Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(true);
    }

    if config.show_version {
        println!("bibstyle {}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    if let Some((input, output)) = &config.compile_template {
        let template = load_template(input)?;
        report_diagnostics(&input.display().to_string(), &template.diagnostics);
        save_template(&template.value, output)?;
        println!("compiled {} -> {}", input.display(), output.display());
        return Ok(!template.diagnostics.has_errors());
    }

    let outcome = StyleRegistry::with_builtin_default();
    report_diagnostics(DEFAULT_STYLE_NAME, &outcome.diagnostics);
    let mut registry = outcome.value;

    let mut style_name = config.style.clone();
    for path in &config.schemas {
        let template = load_template(path)?;
        report_diagnostics(&path.display().to_string(), &template.diagnostics);
        let name = style_name_for(path);
        registry.add_overlay(name.clone(), template.value);
        if config.style.is_none() {
            style_name = Some(name);
        }
    }

    if let Some(path) = &config.config {
        let style_config = load_config(path)?;
        report_diagnostics(&path.display().to_string(), &style_config.diagnostics);
        registry.set_config(style_config.value);
    }

    let style_name = style_name.unwrap_or_else(|| DEFAULT_STYLE_NAME.to_string());
    let style = registry.activate(&style_name)?;
    report_diagnostics(&style_name, &style.diagnostics);

    let validation = ValidationConfig::new()
        .with_strict_calendar(config.strict_dates)
        .with_lints(registry.lints_for(&style_name));
    let validator = EntryValidator::with_config(&style.value, validation);

    let mut clean = true;
    for path in &config.entry_files {
        let entries = load_entries(path)?;
        for (index, entry) in entries.iter().enumerate() {
            let report = validator.validate(&entry.entry_type, &entry.fields);
            let label = entry.key.clone().unwrap_or_else(|| format!("#{}", index + 1));
            for violation in &report.violations {
                clean = false;
                println!("{}: {label} ({}): {violation}", path.display(), entry.entry_type);
            }
        }
    }

    Ok(clean)
}

fn style_name_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}

fn report_diagnostics(source: &str, diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        match diagnostic.severity() {
            Severity::Error => eprintln!("\x1b[31m{source}: {diagnostic}\x1b[0m"),
            Severity::Warning => eprintln!("\x1b[33m{source}: {diagnostic}\x1b[0m"),
        }
    }
}

fn print_help() {
    println!(
        "\x1b[1mBibstyle\x1b[0m - Bibliography entry validator

\x1b[1mUSAGE:\x1b[0m
    bibstyle [OPTIONS] [ENTRY FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [ENTRY FILES...]    JSON arrays of {{\"type\", \"key\", \"fields\"}} records

\x1b[1mOPTIONS:\x1b[0m
    -h, --help                  Print help information
    -V, --version               Print version information
    --schema FILE               Data-model overlay (.dbx source, .json or MessagePack)
    --config FILE               Style configuration (.json or .yaml)
    --style NAME                Style to validate against
    --strict-dates              Reject impossible months and days in dates
    --compile-template IN OUT   Precompile a data-model source and exit

\x1b[1mEXIT STATUS:\x1b[0m
    0    No violations
    1    Violations were reported
    2    The run failed

\x1b[1mENVIRONMENT:\x1b[0m
    RUST_LOG    Log filter, for example RUST_LOG=bibstyle_schema=debug

\x1b[1mEXAMPLES:\x1b[0m
    bibstyle refs.json                          Validate against the default model
    bibstyle --schema apa.dbx refs.json         Validate against an overlay
    bibstyle --config styles.yaml --style apa refs.json
    bibstyle --compile-template apa.dbx apa.msgpack"
    );
}
