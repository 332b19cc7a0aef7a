//! `memomaker config` - show or update saved settings.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use memomaker_core::{Settings, TransferMethod};

#[derive(Args)]
pub struct ConfigArgs {
    /// Save the generation service API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Default prompt language code
    #[arg(long)]
    pub language: Option<String>,

    /// Default transfer method: auto, inline, or upload
    #[arg(long)]
    pub method: Option<TransferMethod>,

    /// Output directory for recordings, transcripts and memos
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Generation model override
    #[arg(long)]
    pub model: Option<String>,

    /// Print the current configuration
    #[arg(long)]
    pub show: bool,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = Settings::load();
    let mut changed = false;

    if let Some(api_key) = args.api_key {
        settings.api_key = Some(api_key);
        changed = true;
    }
    if let Some(language) = args.language {
        settings.language = Some(language);
        changed = true;
    }
    if let Some(method) = args.method {
        settings.method = method;
        changed = true;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = Some(output_dir);
        changed = true;
    }
    if let Some(model) = args.model {
        settings.model = Some(model);
        changed = true;
    }

    if changed {
        settings.save()?;
        println!("configuration saved");
    }

    if args.show || !changed {
        println!(
            "api key: {}",
            if settings.resolve_api_key().is_some() {
                "configured"
            } else {
                "not set"
            }
        );
        println!("language: {}", settings.language.as_deref().unwrap_or("en"));
        println!("method: {}", settings.method);
        println!("output dir: {}", settings.resolve_output_dir().display());
        if let Some(model) = &settings.model {
            println!("model: {model}");
        }
    }

    Ok(())
}
