use std::path::Path;

use anyhow::{bail, Result};

use feedlens_core::{
    feed::source_label,
    opml::{import_into, parse_opml_file},
    AppConfig,
};

pub fn list(config: &AppConfig) -> Result<()> {
    if config.rss_feeds.is_empty() {
        println!("No feeds configured. Use 'feedlens feeds add <url>' to add one.");
        return Ok(());
    }

    println!("{:<4} {:<28} URL", "#", "SOURCE");
    println!("{}", "-".repeat(72));

    for (i, url) in config.rss_feeds.iter().enumerate() {
        println!("{:<4} {:<28} {}", i + 1, source_label(url), url);
    }

    println!("\nTotal: {} feeds", config.rss_feeds.len());

    Ok(())
}

pub fn add(mut config: AppConfig, path: &Path, url: &str) -> Result<()> {
    if !config.add_feed(url) {
        println!("Feed already configured: {}", url.trim());
        return Ok(());
    }

    config.save_to(path)?;
    println!("Added {} ({} feeds)", url.trim(), config.rss_feeds.len());

    Ok(())
}

pub fn remove(mut config: AppConfig, path: &Path, url: &str) -> Result<()> {
    if !config.remove_feed(url) {
        println!("Feed not found: {}", url.trim());
        println!("Use 'feedlens feeds list' to see configured feeds.");
        return Ok(());
    }

    config.save_to(path)?;
    println!("Removed {} ({} feeds left)", url.trim(), config.rss_feeds.len());

    Ok(())
}

pub fn import(mut config: AppConfig, path: &Path, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("File not found: {}", file.display());
    }

    let feeds = parse_opml_file(file)?;
    println!("Found {} feeds in OPML file", feeds.len());

    let added = import_into(&mut config, &feeds);
    if added > 0 {
        config.save_to(path)?;
    }

    println!("\nImport complete:");
    println!("  Added: {}", added);
    println!("  Skipped (already configured): {}", feeds.len() - added);

    Ok(())
}
