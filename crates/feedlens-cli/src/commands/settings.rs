use std::path::Path;

use anyhow::{bail, Result};

use feedlens_core::AppConfig;

pub fn show(config: &AppConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn set(
    mut config: AppConfig,
    path: &Path,
    weeks: Option<u32>,
    workers: Option<usize>,
    timeout: Option<u64>,
) -> Result<()> {
    if weeks.is_none() && workers.is_none() && timeout.is_none() {
        bail!("Nothing to set. Pass --weeks, --workers or --timeout.");
    }

    if let Some(weeks) = weeks {
        config.weeks_limit = weeks;
    }
    if let Some(workers) = workers {
        if workers == 0 {
            bail!("--workers must be at least 1");
        }
        config.max_workers = workers;
    }
    if let Some(timeout) = timeout {
        config.request_timeout = timeout;
    }

    config.save_to(path)?;
    println!(
        "Saved {}: weeks_limit = {}, max_workers = {}, request_timeout = {}s",
        path.display(),
        config.weeks_limit,
        config.max_workers,
        config.request_timeout
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_updates_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set(AppConfig::default(), &path, Some(2), None, Some(10)).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.weeks_limit, 2);
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.request_timeout, 10);
    }

    #[test]
    fn test_set_rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(set(AppConfig::default(), &path, None, Some(0), None).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_requires_a_field() {
        let dir = tempfile::tempdir().unwrap();
        assert!(set(AppConfig::default(), &dir.path().join("c.toml"), None, None, None).is_err());
    }
}
