use blocklog_core::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "blocklog")]
#[command(about = "Leveled console logging with indented blocks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Load logger settings from this TOML file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Threshold level (error, warn, info, log, debug, trace)
    #[arg(long, global = true)]
    level: Option<String>,

    /// Prefix shown before the `|` separator
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Hide timestamps
    #[arg(long, global = true)]
    no_time: bool,

    /// Show time of day only
    #[arg(long, global = true)]
    short_time: bool,

    /// Hide the channel symbol
    #[arg(long, global = true)]
    no_channel: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Append to a file instead of the terminal (give twice for normal, alert)
    #[arg(long = "file", global = true)]
    files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a short story exercising blocks, levels and payloads (default)
    Demo,

    /// Emit a single record
    Emit {
        /// Channel to log on
        channel: String,

        /// Message words, joined with spaces
        #[arg(required = true)]
        message: Vec<String>,

        /// Label shown as `<label>` before the message
        #[arg(long)]
        label: Option<String>,

        /// Parse the message as JSON and log it as a structured value
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    blocklog_core::logging::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    let mut logger = if cli.files.is_empty() {
        Logger::stdio(config)
    } else {
        Logger::to_files(cli.files.as_slice(), config)?
    };

    match cli.command {
        Some(Commands::Emit {
            channel,
            message,
            label,
            json,
        }) => cmd_emit(&mut logger, &channel, &message, label.as_deref(), json),
        Some(Commands::Demo) | None => cmd_demo(&mut logger),
    }
}

fn build_config(cli: &Cli) -> Result<LoggerConfig> {
    let mut config = match &cli.config {
        Some(path) => LoggerConfig::load_from(path)?,
        None => LoggerConfig::load()?,
    };

    if let Some(level) = &cli.level {
        config = config.level_name(level)?;
    }
    if let Some(prefix) = &cli.prefix {
        config.prefix = prefix.clone();
    }
    if cli.no_time {
        config.show_time = false;
    }
    if cli.short_time {
        config.short_time = true;
    }
    if cli.no_channel {
        config.show_channel = false;
    }
    if cli.no_color {
        config.colored = false;
    }

    Ok(config)
}

fn cmd_emit(
    logger: &mut Logger,
    channel: &str,
    message: &[String],
    label: Option<&str>,
    json: bool,
) -> Result<()> {
    let severity = validate(channel)?;
    let text = message.join(" ");
    let payload = if json {
        Payload::from(serde_json::from_str::<serde_json::Value>(&text)?)
    } else {
        Payload::from(text)
    };

    let mut options = WriteOptions::new(severity);
    if let Some(label) = label {
        options = options.label(label);
    }

    if !logger.write(options, payload)? {
        tracing::info!(
            "Record on {} suppressed by threshold {}",
            severity,
            logger.threshold()
        );
    }
    Ok(())
}

fn cmd_demo(logger: &mut Logger) -> Result<()> {
    logger.info("I'm telling you something,")?;
    logger.info("A story.")?;
    logger.debug("This message will not be seen.")?;
    logger.trace(Payload::error(std::io::Error::other(
        "This will neither be traced.",
    )))?;
    logger.log("Nor this one, as the default log level is 'info'!")?;

    logger.enter_block("Story")?;
    logger.info("Long long ago.")?;
    logger.enter_block_at("Warnings", Severity::Warn)?;
    logger.warn("1.This story will be boring.")?;
    logger.warn("2.It's only a single sentence.")?;
    logger.exit_block_at("Warnings", Severity::Warn)?;
    logger.info("The quick brown fox jumps over the lazy dog.")?;
    logger.error("That's it.")?;
    logger.exit_block("Story")?;

    // Show every channel from here on
    logger.change_log_level("trace")?;
    logger.log("Now you should see me")?;
    logger.debug(serde_json::json!({
        "glossary": {
            "title": "example glossary",
            "GlossDiv": {
                "title": "S",
                "GlossList": {
                    "GlossEntry": {
                        "ID": "SGML",
                        "Sorted": true,
                        "GlossTerm": "Standard Generalized Markup Language",
                        "Index": 8879,
                        "Abbrev": "ISO 8879:1986",
                        "GlossDef": {
                            "para": "A meta-markup language, used to create markup languages such as DocBook.",
                            "GlossSeeAlso": ["GML", "XML"]
                        }
                    }
                }
            }
        }
    }))?;

    logger.error(Payload::error(std::io::Error::other("A minor error?")))?;
    logger.trace(Payload::error(std::io::Error::other("A big error!")))?;
    Ok(())
}
