use clap::Parser;
use colored::Colorize;
use exbib::error::Error;
use exbib::processor::Config;
use std::fs;
use std::path::PathBuf;

/// Tools for the ExBib BibTeX style language interpreter.
/// See the subcommands for things it can do.
#[derive(Parser)]
#[clap(version)]
struct Cli {
    #[clap(subcommand)]
    sub_command: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    Doc(Doc),
    Config(ConfigArgs),
}

/// Print documentation for a built-in function
#[derive(Parser)]
struct Doc {
    /// Name of the built-in function, like `format.name$`
    name: Option<String>,
}

/// Print the effective processor configuration as JSON
#[derive(Parser)]
struct ConfigArgs {
    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable tracing
    #[arg(long)]
    trace: bool,

    /// Maximum nesting of function calls
    #[arg(long)]
    max_call_depth: Option<usize>,

    /// String option, in the form KEY=VALUE
    #[arg(long = "option")]
    options: Vec<String>,
}

fn main() {
    let args: Cli = Cli::parse();
    let result = match args.sub_command {
        SubCommand::Doc(d) => doc(d.name),
        SubCommand::Config(c) => config(c),
    };
    if let Err(err) = result {
        println!["{err}"];
        std::process::exit(1);
    }
}

fn doc(name: Option<String>) -> Result<(), String> {
    let built_ins = exbib_stdlib::built_in_functions();
    match name {
        None => {
            let mut names: Vec<&str> = built_ins.keys().copied().collect();
            names.sort();
            let mut last_prefix = None;
            for (i, name) in names.into_iter().enumerate() {
                let new_last_prefix = name.chars().next();
                if last_prefix != new_last_prefix {
                    last_prefix = new_last_prefix;
                    if i != 0 {
                        println!();
                    }
                }
                let doc = built_ins.get(name).and_then(|b| b.doc()).unwrap_or("");
                let first_line = doc.split('\n').next().unwrap_or("");
                println!["{}  {}", name.bold(), first_line];
            }
            Ok(())
        }
        Some(name) => match built_ins.get(name.as_str()) {
            None => Err(Error::function_undefined(&name, built_ins.keys().copied(), None).to_string()),
            Some(built_in) => {
                println!["{}  {}", name.bold(), built_in.doc().unwrap_or("")];
                Ok(())
            }
        },
    }
}

fn config(args: ConfigArgs) -> Result<(), String> {
    let mut config = match &args.config {
        None => Config::default(),
        Some(path) => {
            let data = fs::read_to_string(path)
                .map_err(|err| format!["Failed to open file {path:?}: {err}"])?;
            serde_json::from_str(&data)
                .map_err(|err| format!["Failed to parse configuration {path:?}: {err}"])?
        }
    };
    if args.trace {
        config.trace = true;
    }
    if let Some(depth) = args.max_call_depth {
        config.max_call_depth = depth;
    }
    for option in &args.options {
        let Some((key, value)) = option.split_once('=') else {
            return Err(format!["Option {option:?} is not of the form KEY=VALUE"]);
        };
        config.options.insert(key.to_string(), value.to_string());
    }
    let json = serde_json::to_string_pretty(&config)
        .map_err(|err| format!["Failed to serialize configuration: {err}"])?;
    println!["{json}"];
    Ok(())
}
