use std::{fs, io::Read, path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};
use ll1_trace::{AnalysisError, Grammar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Productions in canonical order
    Prod,
    /// FIRST and FOLLOW sets
    Ff,
    /// LL(1) parsing table
    Ll1,
    /// Derivation trace of --input
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Latex,
    Json,
}

/// Analyze an LL(1) grammar and trace the parse of an input string.
#[derive(Debug, Parser)]
#[command(name = "ll1-trace", version)]
struct Cli {
    /// What to print, in order
    #[arg(value_enum, required = true, num_args = 1..)]
    outputs: Vec<Output>,

    /// Input text to parse, needed by the `trace` output
    #[arg(short, long)]
    input: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// Grammar file, read from stdin when omitted
    #[arg(short, long)]
    grammar: Option<PathBuf>,
}

fn read_grammar(path: Option<&PathBuf>) -> std::io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().lock().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn run(cli: &Cli, text: &str) -> Result<(), AnalysisError> {
    let g = Grammar::parse(text)?;
    let sets = g.calculate_first_follow();

    for output in &cli.outputs {
        match output {
            Output::Prod => {
                let t = g.to_production_output_vec();
                println!(
                    "{}",
                    match cli.format {
                        OutputFormat::Plain => t.to_plaintext(),
                        OutputFormat::Latex => t.to_latex(),
                        OutputFormat::Json => ll1_trace::to_json(&t)?,
                    }
                );
            }
            Output::Ff => {
                let t = g.to_first_follow_output_vec(&sets);
                println!(
                    "{}",
                    match cli.format {
                        OutputFormat::Plain => t.to_plaintext(),
                        OutputFormat::Latex => t.to_latex(),
                        OutputFormat::Json => t.to_json()?,
                    }
                );
            }
            Output::Ll1 => {
                let table = g.build_predictive_table(&sets);
                let t = g.generate_ll1_parsing_table(&table);
                println!(
                    "{}",
                    match cli.format {
                        OutputFormat::Plain => t.to_plaintext(),
                        OutputFormat::Latex => t.to_latex(),
                        OutputFormat::Json => ll1_trace::to_json(&t)?,
                    }
                );
            }
            Output::Trace => {
                let input = cli.input.as_deref().unwrap_or_default();
                let analysis = ll1_trace::analyze(text, input)?;
                println!(
                    "{}",
                    match cli.format {
                        OutputFormat::Plain => analysis.trace.to_plaintext(),
                        OutputFormat::Latex => analysis.trace.to_latex(),
                        OutputFormat::Json => analysis.to_output().to_json()?,
                    }
                );
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.outputs.contains(&Output::Trace) && cli.input.is_none() {
        eprintln!("the `trace` output needs --input");
        return ExitCode::FAILURE;
    }

    let text = match read_grammar(cli.grammar.as_ref()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("failed to read grammar: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &text) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
