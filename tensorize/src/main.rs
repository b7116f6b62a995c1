use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tensorize::{
    build_tensor, CsvOptions, CsvSource, DatePart, Error, KeyTransform, MergeOptions,
    MergePolicy, Result, SortPolicy, TensorConfig,
};
use tracing_subscriber::EnvFilter;

/// Construct a sparse coordinate tensor from CSV-like files.
///
/// Fields can be specified by their name if the CSV file has a header, or
/// otherwise with a 1-indexed integer corresponding to their column. The
/// field separator and header presence are detected automatically; use
/// `--query` to inspect what is detected. If no `--vals` field is provided,
/// a binary tensor is constructed.
#[derive(Debug, Parser)]
#[command(name = "tensorize", version, about)]
struct Cli {
    /// Input CSV files, followed by the output tensor file (.tns).
    #[arg(required = true, num_args = 1..)]
    files: Vec<PathBuf>,

    /// Include FIELD as a tensor mode (repeatable; order defines the
    /// coordinate order).
    #[arg(short = 'f', long = "field", value_name = "FIELD")]
    fields: Vec<String>,

    /// The field to use for tensor values.
    #[arg(long, value_name = "FIELD")]
    vals: Option<String>,

    /// Sort a field's keys lexicographically (repeatable).
    #[arg(short = 'l', long = "sort-lex", value_name = "FIELD")]
    sort_lex: Vec<String>,

    /// Sort a field's integer keys numerically (repeatable).
    #[arg(short = 'n', long = "sort-num", value_name = "FIELD")]
    sort_num: Vec<String>,

    /// Set a field's key type: str, int, float, round:<digits>, or
    /// date:<year|month|day> (repeatable).
    #[arg(short = 't', long = "field-type", value_name = "FIELD=TYPE")]
    field_types: Vec<String>,

    /// CSV field separator (default: auto-detect).
    #[arg(short = 'F', long = "field-sep", value_name = "CHAR")]
    field_sep: Option<char>,

    /// Whether the CSVs have a header row (default: auto-detect).
    #[arg(long, value_enum, value_name = "yes|no")]
    has_header: Option<HeaderChoice>,

    /// Print what is auto-detected in the first input file and exit.
    #[arg(short = 'q', long = "query", value_enum)]
    query: Vec<QueryKind>,

    /// Consolidate duplicate coordinate tuples with this reduction.
    #[arg(long, value_enum, default_value_t = MergeChoice::None)]
    merge: MergeChoice,

    /// In-memory chunk bound (lines) for the external merge sort.
    #[arg(long, value_name = "N", default_value_t = 1_000_000)]
    merge_chunk_lines: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeaderChoice {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QueryKind {
    FieldSep,
    Header,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MergeChoice {
    None,
    Sum,
    Min,
    Max,
    Avg,
    Count,
}

impl MergeChoice {
    fn to_policy(self) -> MergePolicy {
        match self {
            MergeChoice::None => MergePolicy::None,
            MergeChoice::Sum => MergePolicy::Sum,
            MergeChoice::Min => MergePolicy::Min,
            MergeChoice::Max => MergePolicy::Max,
            MergeChoice::Avg => MergePolicy::Mean,
            MergeChoice::Count => MergePolicy::Count,
        }
    }
}

/// Parse a `FIELD=TYPE` argument into a field name and transform.
fn parse_field_type(arg: &str) -> Result<(String, KeyTransform)> {
    let (field, kind) = arg.split_once('=').ok_or_else(|| {
        Error::Config(format!("expected FIELD=TYPE, got '{arg}'"))
    })?;
    let transform = match kind {
        "str" => KeyTransform::Str,
        "int" => KeyTransform::Int,
        "float" => KeyTransform::Float,
        _ => {
            if let Some(digits) = kind.strip_prefix("round:") {
                let digits = digits.parse::<u32>().map_err(|_| {
                    Error::Config(format!("bad rounding precision in '{arg}'"))
                })?;
                KeyTransform::Round { digits }
            } else if let Some(part) = kind.strip_prefix("date:") {
                let part = match part {
                    "year" => DatePart::Year,
                    "month" => DatePart::Month,
                    "day" => DatePart::Day,
                    other => {
                        return Err(Error::Config(format!(
                            "unknown date part '{other}' (expected year, month, or day)"
                        )));
                    }
                };
                KeyTransform::Date { part }
            } else {
                return Err(Error::Config(format!("unknown field type '{kind}'")));
            }
        }
    };
    Ok((field.to_string(), transform))
}

fn csv_options(cli: &Cli) -> CsvOptions {
    CsvOptions {
        delimiter: cli.field_sep.map(|c| c as u8),
        has_header: cli.has_header.map(|h| matches!(h, HeaderChoice::Yes)),
        ..CsvOptions::default()
    }
}

/// Answer `--query` flags against the first input and exit successfully.
fn run_queries(cli: &Cli) -> Result<()> {
    let source = CsvSource::open(&cli.files[0], &csv_options(cli))?;
    for query in &cli.query {
        match query {
            QueryKind::FieldSep => {
                println!("Found delimiter: \"{}\"", char::from(source.delimiter()));
            }
            QueryKind::Header => {
                println!("Found fields:");
                for name in source.header() {
                    println!("  {name}");
                }
            }
        }
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<TensorConfig> {
    let mut files = cli.files.clone();
    if files.len() < 2 {
        return Err(Error::Config(
            "expected at least one input CSV and an output tensor file".into(),
        ));
    }
    let output = files.pop().unwrap_or_default();
    let mut config = TensorConfig::new(files, output);

    if let Some(sep) = cli.field_sep {
        config.set_delimiter(sep as u8);
    }
    if let Some(choice) = cli.has_header {
        config.set_header(matches!(choice, HeaderChoice::Yes));
    }

    if cli.fields.is_empty() {
        return Err(Error::Config(
            "tensor has no modes; pass at least one --field".into(),
        ));
    }
    for field in &cli.fields {
        config.add_mode(field);
    }
    for field in &cli.sort_lex {
        config.set_mode_sort(field, SortPolicy::Lex)?;
    }
    for field in &cli.sort_num {
        // Numeric ordering implies integer-typed keys unless a --field-type
        // overrides the transform below.
        config.set_mode_transform(field, KeyTransform::Int)?;
        config.set_mode_sort(field, SortPolicy::Num)?;
    }
    for arg in &cli.field_types {
        let (field, transform) = parse_field_type(arg)?;
        config.set_mode_transform(&field, transform)?;
    }
    if let Some(vals) = &cli.vals {
        config.set_values(vals);
    }

    config.set_merge(cli.merge.to_policy());
    config.set_merge_options(MergeOptions {
        chunk_lines: cli.merge_chunk_lines,
    });
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.query.is_empty() {
        return run_queries(cli);
    }

    let config = build_config(cli)?;
    let summary = build_tensor(&config)?;
    println!(
        "wrote {}: {} non-zeros, dimensions {}",
        config.output().display(),
        summary.rows_emitted,
        summary
            .mode_sizes
            .iter()
            .map(|size| size.to_string())
            .collect::<Vec<_>>()
            .join("x")
    );
    if summary.rows_pruned > 0 {
        println!("pruned {} inconsistent rows", summary.rows_pruned);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_arguments_parse() {
        assert!(matches!(
            parse_field_type("year=int"),
            Ok((field, KeyTransform::Int)) if field == "year"
        ));
        assert!(matches!(
            parse_field_type("price=round:2"),
            Ok((_, KeyTransform::Round { digits: 2 }))
        ));
        assert!(matches!(
            parse_field_type("when=date:month"),
            Ok((_, KeyTransform::Date { part: DatePart::Month }))
        ));
        assert!(parse_field_type("year").is_err());
        assert!(parse_field_type("year=complex").is_err());
        assert!(parse_field_type("when=date:hour").is_err());
    }

    #[test]
    fn last_positional_is_the_output() {
        let cli = Cli::parse_from([
            "tensorize", "a.csv", "b.csv", "out.tns", "-f", "user", "-f", "item",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.inputs().len(), 2);
        assert_eq!(config.output(), std::path::Path::new("out.tns"));
        assert_eq!(config.num_modes(), 2);
    }

    #[test]
    fn sort_num_implies_integer_keys() {
        let cli = Cli::parse_from([
            "tensorize", "a.csv", "out.tns", "-f", "year", "-n", "year",
        ]);
        let config = build_config(&cli).unwrap();
        let mode = config.mode("year").unwrap();
        assert!(matches!(mode.transform, KeyTransform::Int));
        assert_eq!(mode.sort, SortPolicy::Num);
    }

    #[test]
    fn missing_modes_or_output_is_rejected() {
        let cli = Cli::parse_from(["tensorize", "a.csv", "out.tns"]);
        assert!(build_config(&cli).is_err());

        let cli = Cli::parse_from(["tensorize", "only.tns", "-f", "user"]);
        assert!(build_config(&cli).is_err());
    }
}
