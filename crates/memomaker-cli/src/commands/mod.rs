pub mod config;
pub mod process;
pub mod record;

use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use memomaker_core::{
    GeminiBackend, Orchestrator, ProcessorConfig, PromptLibrary, PromptPair, Settings,
};

/// Build an orchestrator from saved settings, the environment and the
/// prompt library in the current directory.
pub fn build_orchestrator(language_override: Option<&str>) -> Result<(Orchestrator, Settings)> {
    let settings = Settings::load();

    let api_key = settings.resolve_api_key().context(
        "no API key configured. Set GOOGLE_API_KEY or run: memomaker config --api-key <key>",
    )?;

    let language = language_override
        .map(str::to_string)
        .or_else(|| settings.language.clone())
        .unwrap_or_else(|| "en".to_string());
    let library = PromptLibrary::new(std::env::current_dir()?);
    let prompts = library
        .load(&language)?
        .unwrap_or_else(PromptPair::defaults);

    let mut config = ProcessorConfig::new(&api_key, settings.resolve_output_dir())
        .with_prompts(prompts);
    let mut backend = GeminiBackend::new(&api_key)?;
    if let Some(model) = &settings.model {
        config = config.with_model(model);
        backend = backend.with_model(model);
    }

    let orchestrator = Orchestrator::new(config, Arc::new(backend))
        .on_log(|line| println!("{line}"));

    Ok((orchestrator, settings))
}

/// Block until the user presses Enter, without echoing input.
pub fn wait_for_enter() -> Result<()> {
    use std::io::Write;
    std::io::stdout().flush()?;

    enable_raw_mode()?;
    loop {
        if let Event::Key(key_event) = event::read()? {
            if key_event.code == KeyCode::Enter {
                break;
            }
        }
    }
    disable_raw_mode()?;

    Ok(())
}
