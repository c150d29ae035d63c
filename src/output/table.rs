use unicode_width::UnicodeWidthStr;

use crate::db::models::{Article, ArticleResult, Author, DbStats};

/// Truncate a string to max_width display columns, unicode-aware.
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Format article results as a table.
pub fn print_article_results(results: &[ArticleResult]) {
    if results.is_empty() {
        println!("No articles matched.");
        return;
    }

    println!(
        "{} article{}:\n",
        results.len(),
        if results.len() == 1 { "" } else { "s" }
    );

    // Header
    println!(
        "  {:<42} {:<11} {:<12} {:<22}",
        "TITLE", "STATUS", "DATE", "AUTHOR"
    );
    println!("  {}", "-".repeat(89));

    for r in results {
        let date_short = r.inserted_at.get(..10).unwrap_or(&r.inserted_at);
        println!(
            "  {:<42} {:<11} {:<12} {:<22}",
            truncate(&r.title, 40),
            r.status,
            date_short,
            truncate(&r.author, 22),
        );
        println!("  id: {}\n", r.id);
    }
}

/// Format a single article's details for `artq show`.
pub fn print_article_detail(article: &Article, author: Option<&Author>) {
    println!("Article: {}", article.title);
    println!("  ID:      {}", article.id);
    println!("  Status:  {}", article.status);
    println!("  Created: {}", article.inserted_at);
    if let Some(author) = author {
        println!("  Author:  {} {}", author.first_name, author.last_name);
    }

    if !article.summary.is_empty() {
        println!("\nSummary:");
        for line in article.summary.lines() {
            println!("  {line}");
        }
    }
}

/// Print database stats.
pub fn print_stats(stats: &DbStats) {
    println!("Database Statistics:");
    println!("  Authors:  {}", stats.authors);
    println!("  Articles: {}", stats.articles);
    println!("  DB Size:  {}", format_bytes(stats.db_size_bytes));
    if !stats.statuses.is_empty() {
        println!("\n  By status:");
        for sc in &stats.statuses {
            println!("    {:<12} {}", sc.status, sc.count);
        }
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
