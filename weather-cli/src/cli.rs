use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use weather_core::{Config, Orchestrator, Session, WeatherReading, provider_from_config};

use crate::chat;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather chatbot backed by a local LLM")]
pub struct Cli {
    /// Log requests and tool calls to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather API key and the LLM backend.
    Configure,

    /// Show current weather for a city, without the LLM.
    Show {
        /// City name, e.g. "Tokyo" or "London,GB".
        city: String,
    },

    /// Ask a single question and print the answer.
    Ask {
        /// The question, e.g. "Is it raining in Mumbai?"
        question: String,
    },

    /// Start an interactive chat session.
    Chat,
}

pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Configure => configure(&config_path)?,
            Command::Show { city } => {
                let config = Config::load_from(&config_path)?.with_env_overrides();
                let provider = provider_from_config(&config)?;

                let reading = provider
                    .fetch_weather(&city)
                    .await
                    .with_context(|| format!("Failed to fetch weather for '{city}'"))?;

                print!("{}", format_reading(&reading));
            }
            Command::Ask { question } => {
                let config = Config::load_from(&config_path)?.with_env_overrides();
                let orchestrator = Orchestrator::from_config(&config)?;

                let mut session = new_session(&config);
                session.push_user(question);
                println!("{}", orchestrator.complete(&session.context()).await);
            }
            Command::Chat => {
                let config = Config::load_from(&config_path)?.with_env_overrides();
                let orchestrator = Orchestrator::from_config(&config)?;

                chat::run(&orchestrator, new_session(&config)).await?;
            }
        }

        Ok(())
    }
}

fn new_session(config: &Config) -> Session {
    Session::new(config.chat.system_prompt(), config.chat.history_window)
}

fn configure(path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_from(path)?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.weather.api_key = Some(api_key.trim().to_string());
    }

    let url = Text::new("Chat completions URL:")
        .with_default(&config.backend.url)
        .prompt()?;
    let model = Text::new("Model name:")
        .with_default(&config.backend.model)
        .prompt()?;

    config.backend.url = url;
    config.backend.model = model;

    config.save_to(path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn format_reading(reading: &WeatherReading) -> String {
    let mut out = format!(
        "{}, {}: {:.1}°C, {}\n",
        reading.city, reading.country, reading.temperature, reading.description
    );

    if let Some(feels_like) = reading.feels_like {
        out.push_str(&format!("  Feels like: {feels_like:.1}°C\n"));
    }
    out.push_str(&format!("  Humidity:   {}%\n", reading.humidity));
    if let Some(wind) = reading.wind_speed {
        out.push_str(&format!("  Wind:       {wind:.1} m/s\n"));
    }
    if let Some(pressure) = reading.pressure {
        out.push_str(&format!("  Pressure:   {pressure} hPa\n"));
    }
    if let Some(at) = reading.observed_at {
        out.push_str(&format!(
            "  Observed:   {}\n",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ));
    }

    out
}
