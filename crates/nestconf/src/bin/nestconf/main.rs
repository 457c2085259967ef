mod cli;
mod schema;

use anyhow::Context;
use nestconf::include::EmptyIncludePolicy;
use nestconf::{render, Document, ParseOptions, Value};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("NESTCONF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Dump(dump_cli) => dump(dump_cli),
        cli::Command::Check(check_cli) => check(check_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn dump(cli: cli::DumpCommand) -> anyhow::Result<()> {
    let document = load(&cli.input)?;
    let raw = document.parse()?;

    output(&cli.output, &Value::Map(raw.to_mapping()), || {
        render::raw_to_string(&raw)
    })
}

pub fn check(cli: cli::CheckCommand) -> anyhow::Result<()> {
    let schema = schema::load(&cli.schema)
        .with_context(|| format!("Failed to load schema {}", cli.schema.display()))?;
    let document = load(&cli.input)?;
    let config = document.validate(&schema)?;
    tracing::info!(source = document.source(), "configuration is valid");

    output(&cli.output, &Value::Map(config.to_mapping()), || {
        render::to_string(&config)
    })
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Document> {
    let document = match &input.file {
        Some(path) => Document::from_file(path)?,
        None => {
            let stdin = std::io::read_to_string(std::io::stdin())?;
            Document::from_text(stdin, "<stdin>")
        }
    };

    let empty_include = if input.strict_includes {
        EmptyIncludePolicy::Error
    } else {
        EmptyIncludePolicy::Ignore
    };

    Ok(document.with_options(ParseOptions {
        max_include_depth: input.max_include_depth,
        max_nesting: input.max_nesting,
        empty_include,
    }))
}

/// `conf` renders lazily, the other formats serialize `value`
fn output(
    output: &cli::OutputArgs,
    value: &Value,
    conf: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
        cli::OutputFormat::Conf => print!("{}", conf()),
    };

    Ok(())
}

/// (nestconf-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let document = load(&cli.input)?;

    match cli.command {
        Tokens => {
            for token in nestconf::lexer::tokenize(document.text(), document.source())? {
                println!("{} {:?} {:?}", token.position, token.kind, token.text);
            }
        }
        Tree => println!("{:#?}", document.parse()?),
    }

    Ok(())
}
