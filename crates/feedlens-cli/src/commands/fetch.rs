use std::io::{self, BufRead, Write};

use anyhow::Result;

use feedlens_core::{Aggregator, AppConfig, Article, ProgressEvent};

pub async fn run(config: &AppConfig, pick: bool) -> Result<()> {
    let fetch_config = config.fetch_config();
    let aggregator = Aggregator::new(&fetch_config)?;

    eprintln!("Fetching {} feeds...\n", fetch_config.feeds.len());

    // Feed-level events carry 0 or 100; the engine adds a running total per finished feed
    let report = |event: &ProgressEvent| {
        eprintln!(
            "  {:<10} {:>5.1}%  {}",
            event.status.as_str(),
            event.progress,
            event.feed_url
        );
    };

    let articles = aggregator.fetch_all(&fetch_config, &report).await;
    eprintln!();

    if articles.is_empty() {
        println!("No articles within the last {} week(s).", config.weeks_limit);
        return Ok(());
    }

    print_articles(&articles);

    if pick {
        pick_loop(&articles)?;
    }

    Ok(())
}

fn print_articles(articles: &[Article]) {
    for (index, article) in articles.iter().enumerate() {
        let title = if article.title.is_empty() { "(untitled)" } else { article.title.as_str() };
        println!(
            "{:>3}. [{}] {} ({})",
            index + 1,
            article.relative_time(),
            title,
            article.source
        );
    }
}

/// Prompt for article numbers until the user enters 0 or closes stdin
fn pick_loop(articles: &[Article]) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nArticle number to open (0 to quit): ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };

        match parse_choice(&line?, articles.len()) {
            Choice::Quit => return Ok(()),
            Choice::Open(index) => {
                let article = &articles[index];
                if !article.has_link() {
                    println!("That article has no link.");
                } else if let Err(e) = open::that_detached(&article.link) {
                    tracing::warn!("Failed to open {}: {}", article.link, e);
                    println!("Could not open browser: {}", e);
                }
            }
            Choice::OutOfRange => println!("Invalid choice, try again."),
            Choice::NotANumber => println!("Please enter an article number."),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Quit,
    Open(usize),
    OutOfRange,
    NotANumber,
}

fn parse_choice(input: &str, count: usize) -> Choice {
    match input.trim().parse::<usize>() {
        Ok(0) => Choice::Quit,
        Ok(n) if n <= count => Choice::Open(n - 1),
        Ok(_) => Choice::OutOfRange,
        Err(_) => Choice::NotANumber,
    }
}
