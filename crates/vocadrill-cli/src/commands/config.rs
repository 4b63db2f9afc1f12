use clap::Subcommand;
use vocadrill_core::{Config, ConfigError};

use super::CmdResult;

const SECTIONS: [&str; 3] = ["scheduler", "storage", "catalog"];

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value (e.g. "scheduler.review_threshold", "storage.autosave")
    Get { key: String },
    /// Change one value; scheduler constants are validated before saving
    Set { key: String, value: String },
    /// Print config.toml, or only one of its sections
    List {
        /// One of: scheduler, storage, catalog
        section: Option<String>,
    },
    /// Restore the default scheduler, storage and catalog settings
    Reset,
}

/// `config.toml` text for `config`, limited to `section` when given.
fn render(config: &Config, section: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    let Some(name) = section else {
        return Ok(toml::to_string_pretty(config)?);
    };
    if !SECTIONS.contains(&name) {
        return Err(ConfigError::UnknownKey(name.to_string()).into());
    }
    let mut table = toml::Table::try_from(config)?;
    let mut only = toml::Table::new();
    if let Some(value) = table.remove(name) {
        only.insert(name.to_string(), value);
    }
    Ok(toml::to_string_pretty(&only)?)
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| ConfigError::UnknownKey(key.clone()))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            tracing::info!(%key, %value, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { section } => {
            let config = Config::load()?;
            print!("{}", render(&config, section.as_deref())?);
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            let policy = config.scheduler;
            println!(
                "config reset: review_threshold={} base_cooldown_days={} requeue_offset={} forgotten_penalty={}",
                policy.review_threshold,
                policy.base_cooldown_days,
                policy.requeue_offset,
                policy.forgotten_penalty
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_listing_has_every_section() {
        let text = render(&Config::default(), None).unwrap();
        for section in ["scheduler", "storage"] {
            assert!(text.contains(&format!("[{section}]")), "missing [{section}] in {text}");
        }
        assert!(text.contains("review_threshold = 3"));
    }

    #[test]
    fn section_listing_keeps_only_that_section() {
        let text = render(&Config::default(), Some("storage")).unwrap();
        assert!(text.contains("[storage]"));
        assert!(text.contains("snapshot_key = \"knownWords\""));
        assert!(!text.contains("[scheduler]"));
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(render(&Config::default(), Some("theme")).is_err());
    }
}
