#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use super::ui::help_text;
use super::ui::model_list_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::ConversationMode;
use crate::domain::models::Document;
use crate::domain::services::Extractor;
use crate::infrastructure::backends::BackendManager;

/// What `main` should do once arguments and configuration are handled.
#[derive(Debug, PartialEq, Eq)]
pub enum Run {
    Chat {
        file: Option<path::PathBuf>,
    },
    Ask {
        prompt: String,
        file: Option<path::PathBuf>,
    },
    Exit,
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn print_extracted(file: &str) -> Result<()> {
    let document = Document::from_path(path::Path::new(file)).await?;
    println!("{}", Extractor::extract(&document));

    return Ok(());
}

async fn print_models() -> Result<()> {
    let backend = BackendManager::get(&Config::get(ConfigKey::Backend))?;
    backend.health_check().await?;

    let models = backend.list_models().await?;
    println!("{}", model_list_text(&models));
    return Ok(());
}

fn arg_file() -> Arg {
    return Arg::new("file")
        .short('f')
        .long("file")
        .num_args(1)
        .value_parser(value_parser!(path::PathBuf))
        .help("Attach a PDF, TXT, CSV or XLSX file. Its text is appended to your prompts.");
}

fn subcommand_ask() -> Command {
    return Command::new("ask")
        .about("Ask a single question, print the exchange and exit.")
        .arg(
            Arg::new("prompt")
                .help("The question to ask. May be empty when a file is attached.")
                .num_args(1)
                .default_value(""),
        )
        .arg(arg_file());
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start an interactive chat session.")
        .arg(arg_file());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_extract() -> Command {
    return Command::new("extract")
        .about("Print the text Vertex extracts from a file, exactly as it would be sent.")
        .arg(
            Arg::new("path")
                .help("File to extract.")
                .num_args(1)
                .required(true),
        );
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("vertex")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_ask())
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_extract())
        .subcommand(Command::new("models").about("Lists the models available to your API key."))
        .arg(
            Arg::new(ConfigKey::Backend.to_string())
                .short('b')
                .long(ConfigKey::Backend.to_string())
                .env("VERTEX_BACKEND")
                .num_args(1)
                .help(format!(
                    "OpenAI API flavour used to request completions. [default: {}]",
                    Config::default(ConfigKey::Backend)
                ))
                .value_parser(PossibleValuesParser::new(BackendName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::BackendTimeout.to_string())
                .long(ConfigKey::BackendTimeout.to_string())
                .env("VERTEX_BACKEND_TIMEOUT")
                .num_args(1)
                .help(format!(
                    "Time to wait in milliseconds for the backend before giving up on a request. [default: {}]",
                    Config::default(ConfigKey::BackendTimeout)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("VERTEX_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConversationMode.to_string())
                .long(ConfigKey::ConversationMode.to_string())
                .env("VERTEX_CONVERSATION_MODE")
                .num_args(1)
                .help(format!(
                    "Send only the current question, or the whole conversation, to the model. [default: {}]",
                    Config::default(ConfigKey::ConversationMode)
                ))
                .value_parser(PossibleValuesParser::new(ConversationMode::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("VERTEX_MODEL")
                .num_args(1)
                .help(format!(
                    "The model answering your questions. [default: {}]",
                    Config::default(ConfigKey::Model)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiURL.to_string())
                .long(ConfigKey::OpenAiURL.to_string())
                .env("VERTEX_OPENAI_URL")
                .num_args(1)
                .help(format!("OpenAI API URL. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::OpenAiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiToken.to_string())
                .long(ConfigKey::OpenAiToken.to_string())
                .env("VERTEX_OPENAI_TOKEN")
                .num_args(1)
                .hide_env_values(true)
                .help("OpenAI API key. Falls back to the OPENAI_API_KEY environment variable.")
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .action(ArgAction::SetTrue)
                .help("Disable colored output.")
                .global(true),
        );
}

fn file_arg(matches: &ArgMatches) -> Option<path::PathBuf> {
    return matches.get_one::<path::PathBuf>("file").cloned();
}

pub async fn parse() -> Result<Run> {
    return parse_from(build().get_matches()).await;
}

pub async fn parse_from(matches: ArgMatches) -> Result<Run> {
    if matches.get_flag("no-color") {
        Paint::disable();
    }

    match matches.subcommand() {
        Some(("ask", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let prompt = subcmd_matches
                .get_one::<String>("prompt")
                .cloned()
                .unwrap_or_default();
            return Ok(Run::Ask {
                prompt,
                file: file_arg(subcmd_matches),
            });
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Run::Chat {
                file: file_arg(subcmd_matches),
            });
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        Some(("extract", subcmd_matches)) => {
            if let Some(file) = subcmd_matches.get_one::<String>("path") {
                print_extracted(file).await?;
            }
        }
        Some(("models", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            print_models().await?;
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
            return Ok(Run::Chat { file: None });
        }
    }

    return Ok(Run::Exit);
}
