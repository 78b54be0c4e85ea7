#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::exit;

use saphyr_json::{
    BudgetReport, DecodeReport, Error, JsonOptions, Options, Value, from_reader_multiple_with_options,
    to_writer_with_options,
};

const USAGE: &str = "\
Usage: saphyr-json [--pretty] [--escape-html] [--non-finite MODE] [--report] <FILE|->

Converts every YAML document in FILE (or stdin for `-`) to one JSON text per line.

Options:
  --pretty            indent the JSON output
  --escape-html       escape <, > and & inside strings
  --non-finite MODE   what to write for .nan/.inf/-.inf:
                        error  (default) fail the conversion
                        null   write null
                        max    null for NaN, +/- largest finite float for infinities
                        string write the YAML spelling as a string
  --report            print budget and alias statistics to stderr";

fn report_budget(report: &BudgetReport) {
    match serde_json::to_string(report) {
        Ok(serialized) => eprintln!("Budget report: {serialized}"),
        Err(err) => eprintln!("Failed to serialize budget report: {err}"),
    }
}

fn report_decode(report: &DecodeReport) {
    match serde_json::to_string(report) {
        Ok(serialized) => eprintln!("Decode report: {serialized}"),
        Err(err) => eprintln!("Failed to serialize decode report: {err}"),
    }
}

struct Args {
    path: String,
    json: JsonOptions,
    options: Options,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut path = None;
    let mut json = JsonOptions::default();
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pretty" => json.pretty = true,
            "--escape-html" => json.escape_html = true,
            "--report" => {
                options.budget_report = Some(report_budget);
                options.decode_report = Some(report_decode);
            }
            "--non-finite" => {
                let mode = args.next().ok_or("--non-finite needs a MODE")?;
                options = apply_non_finite(options, &mode)?;
            }
            flag if flag.starts_with('-') && flag != "-" => return Err(format!("unknown option {flag}")),
            _ if path.is_some() => return Err("expected a single input file".to_owned()),
            input => path = Some(input.to_owned()),
        }
    }
    let path = path.ok_or("expected a path to a YAML file, or - for stdin")?;
    Ok(Args { path, json, options })
}

fn apply_non_finite(options: Options, mode: &str) -> Result<Options, String> {
    Ok(match mode {
        "error" => options,
        "null" => Options {
            nan: Some(Value::Null),
            pos_inf: Some(Value::Null),
            neg_inf: Some(Value::Null),
            ..options
        },
        "max" => options.with_json_float_sentinels(),
        "string" => Options {
            nan: Some(Value::from(".nan")),
            pos_inf: Some(Value::from(".inf")),
            neg_inf: Some(Value::from("-.inf")),
            ..options
        },
        other => return Err(format!("unknown --non-finite mode {other}")),
    })
}

/// Convert a YAML file (or stdin) to JSON, one document per output line.
fn main() {
    if std::env::args().skip(1).any(|arg| arg == "-h" || arg == "--help") {
        println!("{USAGE}");
        return;
    }
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n\n{USAGE}");
            exit(1);
        }
    };

    let reader: Box<dyn Read> = if args.path == "-" {
        Box::new(io::stdin().lock())
    } else {
        match File::open(&args.path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                eprintln!("Failed to read {}: {err}", args.path);
                exit(2);
            }
        }
    };

    let values = match from_reader_multiple_with_options(reader, args.options) {
        Ok(values) => values,
        Err(err) => {
            eprintln!("{} invalid:\n{err}", args.path);
            exit(if matches!(err.inner(), Error::IOError { .. }) { 2 } else { 3 });
        }
    };

    let mut out = io::stdout().lock();
    for value in &values {
        if let Err(err) = to_writer_with_options(&mut out, value, &args.json) {
            eprintln!("{} cannot be written as JSON: {err}", args.path);
            exit(3);
        }
        if let Err(err) = writeln!(out) {
            eprintln!("Failed to write output: {err}");
            exit(2);
        }
    }
}
