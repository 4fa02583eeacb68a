//! Persist CLI defaults

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::output::{print_info, print_success, OutputFormat};

/// Update the saved API URL and/or output format
pub fn configure(path: &Path, api_url: Option<String>, format: Option<OutputFormat>) -> Result<()> {
    let mut config = Config::load_from(path)?;

    if api_url.is_none() && format.is_none() {
        print_info(&format!("Config file: {}", path.display()));
        println!(
            "API URL:         {}",
            config.api_url.as_deref().unwrap_or("(default)")
        );
        println!(
            "Default format:  {}",
            config.default_format.as_deref().unwrap_or("(default)")
        );
        return Ok(());
    }

    if let Some(url) = api_url {
        url::Url::parse(&url)?;
        config.api_url = Some(url);
    }
    if let Some(format) = format {
        config.default_format = Some(format!("{:?}", format).to_lowercase());
    }

    config.save_to(path)?;
    print_success(&format!("Saved {}", path.display()));
    Ok(())
}
