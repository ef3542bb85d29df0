use std::path::PathBuf;

use anyhow::{Context, Result};
use rustyline::{error::ReadlineError, Editor};
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dlrel::config::{LogFormat, LoggingConfig};
use dlrel::{check_program, evaluate, parse_program, parse_query, query, Config, Database};

#[derive(Debug, StructOpt)]
#[structopt(name = "dlrel", about = "Evaluate a Datalog program and answer its queries")]
struct Opt {
    /// Datalog source file. Prompted for when omitted.
    #[structopt(parse(from_os_str))]
    file: Option<PathBuf>,

    /// Iterate every rule together instead of component by component
    #[structopt(long)]
    no_optimize: bool,

    /// Configuration file to use instead of dlrel.toml
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Print the parsed program before evaluating it
    #[structopt(long)]
    print_program: bool,

    /// Keep answering queries typed at a prompt after evaluation
    #[structopt(long)]
    repl: bool,
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.compact().init(),
    }
}

fn prompt_for_file(editor: &mut Editor<()>) -> Result<PathBuf> {
    let line = editor
        .readline("Datalog file: ")
        .context("Failed to read a file name")?;
    Ok(PathBuf::from(line.trim()))
}

fn handle_query(database: &Database, code: &str) -> Result<String> {
    let query = parse_query(code)?;
    Ok(query::answer(database, &query).to_string())
}

fn run_repl(editor: &mut Editor<()>, database: &Database) {
    loop {
        let readline = editor.readline("?- ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str());

                match handle_query(database, line.trim()) {
                    Ok(answer) => {
                        println!("{}", answer);
                    }
                    Err(e) => {
                        println!("Error: {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let mut config = match &opt.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    if opt.no_optimize {
        config.evaluation.optimize = false;
    }

    init_logging(&config.logging);

    let mut editor = Editor::<()>::new();
    let path = match opt.file {
        Some(path) => path,
        None => prompt_for_file(&mut editor)?,
    };

    let code = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let program = parse_program(&code)?;
    info!(
        schemes = program.schemes.len(),
        facts = program.facts.len(),
        rules = program.rules.len(),
        queries = program.queries.len(),
        "parsed program"
    );

    for issue in check_program(&program) {
        warn!("{}", issue);
    }

    if opt.print_program {
        println!("{}", program);
        println!();
    }

    let evaluation = evaluate(&program, &config.evaluation);
    println!("{}", evaluation.report);

    if opt.repl {
        run_repl(&mut editor, &evaluation.database);
    }

    Ok(())
}
