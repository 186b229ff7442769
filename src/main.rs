// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for pseudoroku.
//!
//! This binary provides the `pseudoroku` command for converting chat
//! transcripts to HTML pages.

use lexopt::prelude::*;
use pseudoroku::config::{Config, ConfigError};
use pseudoroku::page::{PageOptions, fill_template};
use pseudoroku::renderer::{DirectoryAssets, RenderContext};
use pseudoroku::tables::{CensorTable, ProfileTable, TableError};
use snafu::{OptionExt, ensure, prelude::*};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Where to write the rendered output.
#[derive(Clone)]
enum OutputTarget {
    /// Write each file to the specified directory.
    Directory(PathBuf),
    /// Write to stdout.
    Stdout,
}

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    input: Vec<PathBuf>,
    output: OutputTarget,
    config: Option<PathBuf>,
    template: Option<PathBuf>,
    censor_list: Option<PathBuf>,
    profile_lookup: Option<PathBuf>,
    icon_dir: Option<String>,
    icon_extension: Option<String>,
    media_dir: Option<String>,
    hide_powered_by: bool,
    verbose: bool,
    quiet: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("{source}"))]
    LoadConfig { source: ConfigError },

    #[snafu(display("at least one input file or directory is required"))]
    NoInputFiles,

    #[snafu(display("cannot output multiple files to stdout"))]
    MultipleFilesToStdout,

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to load {}: {source}", path.display()))]
    ParseCensorList { path: PathBuf, source: TableError },

    #[snafu(display("failed to convert {}: {source}", path.display()))]
    Convert {
        path: PathBuf,
        source: pseudoroku::Error,
    },

    #[snafu(display("invalid input filename: no file stem"))]
    InvalidFilename,

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything shared by the conversion of each input file.
struct Settings {
    template: Option<String>,
    censor: CensorTable,
    profiles: ProfileTable,
    assets: DirectoryAssets,
    page: PageOptions,
}

impl Settings {
    fn context(&self) -> RenderContext<'_> {
        RenderContext {
            censor: &self.censor,
            profiles: &self.profiles,
            assets: &self.assets,
        }
    }
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert chat transcripts to HTML

Usage: {name} [OPTIONS] -o <OUTPUT> <INPUT>...

Arguments:
  <INPUT>...  Transcript files, or directories containing *.txt transcripts

Options:
  -o, --output <OUTPUT>     Output directory (or - for stdout)
  -t, --template <FILE>     Page template with $css and $content placeholders
                            (without one, only the HTML fragment is written)
  -c, --censor <FILE>       Censorship rules, PATTERN<TAB>REPLACEMENT per line
  -p, --profiles <FILE>     Profile links, NAME<TAB>URL per line
      --config <FILE>       JSON config file; flags override its values

Assets:
      --icon-dir <DIR>      Directory of speaker icons (default: icons)
      --icon-ext <EXT>      Icon file extension (default: png)
      --media-dir <DIR>     Directory of images and videos (default: media)
      --hide-powered-by     Omit the \"Powered by\" footer

Other options:
  -v, --verbose             Log pipeline details (or set RUST_LOG)
  -q, --quiet               Suppress progress messages
  -n, --dry-run             Show what would be processed without writing
  -f, --force               Overwrite existing output files
  -h, --help                Print help
  -V, --version             Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input = Vec::new();
    let mut output: Option<OutputTarget> = None;
    let mut config = None;
    let mut template = None;
    let mut censor_list = None;
    let mut profile_lookup = None;
    let mut icon_dir = None;
    let mut icon_extension = None;
    let mut media_dir = None;
    let mut hide_powered_by = false;
    let mut verbose = false;
    let mut quiet = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => {
                let val: PathBuf = parser.value()?.parse()?;
                output = Some(if val == Path::new("-") {
                    OutputTarget::Stdout
                } else {
                    OutputTarget::Directory(val)
                });
            }
            Short('t') | Long("template") => template = Some(parser.value()?.parse()?),
            Short('c') | Long("censor") => censor_list = Some(parser.value()?.parse()?),
            Short('p') | Long("profiles") => profile_lookup = Some(parser.value()?.parse()?),
            Long("config") => config = Some(parser.value()?.parse()?),
            Long("icon-dir") => icon_dir = Some(parser.value()?.string()?),
            Long("icon-ext") => icon_extension = Some(parser.value()?.string()?),
            Long("media-dir") => media_dir = Some(parser.value()?.string()?),
            Long("hide-powered-by") => hide_powered_by = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('q') | Long("quiet") => quiet = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output: output.ok_or("missing required option: --output")?,
        config,
        template,
        censor_list,
        profile_lookup,
        icon_dir,
        icon_extension,
        media_dir,
        hide_powered_by,
        verbose,
        quiet,
        dry_run,
        force,
    })
}

/// Installs the log subscriber. `--verbose` wins over `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_tracing(cli.verbose);

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    let settings = load_settings(&cli)?;

    // Collect all input files first
    let files = collect_input_files(&cli.input);
    tracing::debug!(files = files.len(), "collected inputs");

    match &cli.output {
        OutputTarget::Stdout => {
            ensure!(files.len() == 1, MultipleFilesToStdoutSnafu);
            process_to_stdout(&files[0], &settings, &cli)?;
        }
        OutputTarget::Directory(dir) => {
            if !cli.dry_run {
                std::fs::create_dir_all(dir).context(CreateOutputDirSnafu)?;
            }
            for file in &files {
                process_file(file, dir, &settings, &cli)?;
            }
        }
    }

    Ok(())
}

/// Merges the config file (if any) with command-line flags and loads the
/// template and tables.
fn load_settings(cli: &Cli) -> Result<Settings, Error> {
    let config = match &cli.config {
        Some(path) => Config::load(path).context(LoadConfigSnafu)?,
        None => Config::default(),
    };

    let template = cli
        .template
        .clone()
        .or(config.template)
        .map(|path| read_file(&path))
        .transpose()?;

    let censor = match cli.censor_list.clone().or(config.censor_list) {
        Some(path) => {
            let text = read_file(&path)?;
            CensorTable::parse(&text).context(ParseCensorListSnafu { path })?
        }
        None => CensorTable::default(),
    };

    let profiles = match cli.profile_lookup.clone().or(config.profile_lookup) {
        Some(path) => ProfileTable::parse(&read_file(&path)?),
        None => ProfileTable::default(),
    };

    let defaults = DirectoryAssets::default();
    let assets = DirectoryAssets {
        icon_dir: cli
            .icon_dir
            .clone()
            .or(config.icon_dir)
            .unwrap_or(defaults.icon_dir),
        icon_extension: cli
            .icon_extension
            .clone()
            .or(config.icon_extension)
            .unwrap_or(defaults.icon_extension),
        media_dir: cli
            .media_dir
            .clone()
            .or(config.media_dir)
            .unwrap_or(defaults.media_dir),
    };

    let hide_powered_by = cli.hide_powered_by || config.hide_powered_by.unwrap_or(false);
    tracing::debug!(
        censor_rules = censor.len(),
        template = template.is_some(),
        "settings loaded"
    );

    Ok(Settings {
        template,
        censor,
        profiles,
        assets,
        page: PageOptions {
            show_powered_by: !hide_powered_by,
        },
    })
}

fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).context(ReadFileSnafu { path })
}

/// Collects all transcript files from the given inputs (files and directories).
fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Converts one transcript and fills the page template, if any.
fn render_file(input: &Path, settings: &Settings) -> Result<String, Error> {
    let text = read_file(input)?;
    let fragment =
        pseudoroku::convert(&text, &settings.context()).context(ConvertSnafu { path: input })?;

    Ok(match &settings.template {
        Some(template) => fill_template(template, &fragment, &settings.page),
        None => fragment,
    })
}

/// Processes a single file and outputs to stdout.
fn process_to_stdout(input: &Path, settings: &Settings, cli: &Cli) -> Result<(), Error> {
    if cli.dry_run {
        eprintln!("Would output {}", input.display());
        return Ok(());
    }

    let html = render_file(input, settings)?;
    print!("{html}");
    Ok(())
}

/// Processes a single file and writes to the output directory.
fn process_file(input: &Path, out_dir: &Path, settings: &Settings, cli: &Cli) -> Result<(), Error> {
    let out_name = input.file_stem().context(InvalidFilenameSnafu)?;
    let out_path = out_dir.join(format!("{}.html", out_name.to_string_lossy()));

    // Handle dry-run mode
    if cli.dry_run {
        eprintln!("Would write {}", out_path.display());
        return Ok(());
    }

    // Check if output exists and handle overwrite
    if out_path.exists() && !cli.force {
        eprintln!(
            "Skipping {} (already exists, use --force to overwrite)",
            out_path.display()
        );
        return Ok(());
    }

    let html = render_file(input, settings)?;
    std::fs::write(&out_path, &html).context(WriteFileSnafu { path: &out_path })?;

    if !cli.quiet {
        eprintln!("Wrote {}", out_path.display());
    }
    Ok(())
}
