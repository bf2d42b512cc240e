use clap::Parser;
use serde::Deserialize;
use std::process::ExitCode;
use structural_equivalency::{Configuration, Options, Report, Value};
use tracing::{debug, Level};

/// Compare two JSON documents for structural equivalency.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Subject JSON document, inline or `@path/to/file.json`
    subject: String,
    /// Expected JSON document, inline or `@path/to/file.json`
    expectation: String,
    /// Leave a member out of the comparison (repeatable)
    #[arg(long = "exclude")]
    excludes: Vec<String>,
    /// Only compare the selected members (repeatable)
    #[arg(long = "include")]
    includes: Vec<String>,
    /// Ignore the order of every collection
    #[arg(long)]
    unordered: bool,
    /// Ignore the order of the selected collection (repeatable)
    #[arg(long = "unordered-for")]
    unordered_for: Vec<String>,
    /// Maximum recursion depth
    #[arg(long)]
    max_depth: Option<usize>,
    /// Skip expected members the subject does not have
    #[arg(long)]
    excluding_missing_members: bool,
    /// Accept keys in the subject that the expectation does not have
    #[arg(long)]
    allow_additional_keys: bool,
    /// JSON file holding further options
    #[arg(long)]
    options: Option<String>,
    /// Reason shown in the failure report
    #[arg(long)]
    because: Option<String>,
    /// Print mismatches as JSON
    #[arg(long)]
    json: bool,
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Options read from `--options <file>`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
struct OptionsFile {
    excluding: Vec<String>,
    including: Vec<String>,
    strict_ordering: Option<bool>,
    without_strict_ordering_for: Vec<String>,
    max_recursion_depth: Option<usize>,
    excluding_missing_members: bool,
    allowing_additional_keys: bool,
    reporting_cyclic_references: bool,
    mappings: Vec<(String, String)>,
}

impl OptionsFile {
    fn apply(self, options: Options) -> Options {
        let mut options = self.excluding.into_iter().fold(options, |o, s| o.excluding(s));
        options = self.including.into_iter().fold(options, |o, s| o.including(s));
        options = self
            .without_strict_ordering_for
            .into_iter()
            .fold(options, |o, s| o.without_strict_ordering_for(s));
        options = self
            .mappings
            .iter()
            .fold(options, |o, (expectation, subject)| o.with_mapping(expectation, subject));
        options = match self.strict_ordering {
            Some(true) => options.with_strict_ordering(),
            Some(false) => options.without_strict_ordering(),
            None => options,
        };
        if let Some(depth) = self.max_recursion_depth {
            options = options.with_max_recursion_depth(depth);
        }
        if self.excluding_missing_members {
            options = options.excluding_missing_members();
        }
        if self.allowing_additional_keys {
            options = options.allowing_additional_keys();
        }
        if self.reporting_cyclic_references {
            options = options.reporting_cyclic_references();
        }
        options
    }
}

fn read_source(arg: &str) -> Result<String, String> {
    match arg.strip_prefix('@') {
        Some(file) => std::fs::read_to_string(file).map_err(|e| format!("Cannot read {file}: {e}")),
        None => Ok(arg.to_string()),
    }
}

fn read_document(arg: &str) -> Result<Value, String> {
    let text = read_source(arg)?;
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("Invalid JSON: {e}"))?;
    Ok(Value::from(json))
}

fn configure(args: &Args) -> Result<Configuration, String> {
    let mut options = Options::new();
    if let Some(file) = &args.options {
        let text = read_source(&format!("@{file}"))?;
        let parsed: OptionsFile =
            serde_json::from_str(&text).map_err(|e| format!("Invalid options file: {e}"))?;
        options = parsed.apply(options);
    }
    options = args.excludes.iter().fold(options, |o, s| o.excluding(s));
    options = args.includes.iter().fold(options, |o, s| o.including(s));
    options = args
        .unordered_for
        .iter()
        .fold(options, |o, s| o.without_strict_ordering_for(s));
    if args.unordered {
        options = options.without_strict_ordering();
    }
    if let Some(depth) = args.max_depth {
        options = options.with_max_recursion_depth(depth);
    }
    if args.excluding_missing_members {
        options = options.excluding_missing_members();
    }
    if args.allow_additional_keys {
        options = options.allowing_additional_keys();
    }
    options.build().map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    // Parse CLI arguments.
    let args = Args::parse();
    init_logging(args.verbose);

    let inputs = read_document(&args.subject)
        .and_then(|s| Ok((s, read_document(&args.expectation)?)));
    let (subject, expectation) = match inputs {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let config = match configure(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    debug!(configuration = %config, "configuration built");

    let mismatches = structural_equivalency::compare_with(&subject, &expectation, &config);

    if args.json {
        match serde_json::to_string_pretty(&mismatches) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Cannot serialize mismatches: {e}");
                return ExitCode::from(2);
            }
        }
    } else if !mismatches.is_empty() {
        let report = Report::new(&mismatches)
            .because(args.because.clone().unwrap_or_default())
            .with_configuration(&config);
        print!("{report}");
    }

    if mismatches.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
