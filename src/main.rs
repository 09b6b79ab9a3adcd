#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use anyhow::Result;
use yansi::Paint;

use crate::application::cli;
use crate::application::cli::Run;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::infrastructure::backends::BackendManager;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! Vertex has failed with the following app version and error.\n\nVersion: {}\nError: {:#}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

/// The configured backend, verified before anything is sent to it. A missing
/// API key stops here.
async fn ready_backend() -> Result<BackendBox> {
    let backend = BackendManager::get(&Config::get(ConfigKey::Backend))?;
    backend.health_check().await?;

    return Ok(backend);
}

async fn run(mode: Run) -> Result<()> {
    match mode {
        Run::Chat { file } => {
            let backend = ready_backend().await?;
            return ui::start(backend, file.as_deref()).await;
        }
        Run::Ask { prompt, file } => {
            let backend = ready_backend().await?;
            return ui::ask(backend, &prompt, file.as_deref()).await;
        }
        Run::Exit => return Ok(()),
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = env::var("VERTEX_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("vertex")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("vertex")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    Config::load_dotenv(None);

    let mode = match cli::parse().await {
        Ok(mode) => mode,
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    if let Err(err) = run(mode).await {
        handle_error(err);
    }

    process::exit(0);
}
