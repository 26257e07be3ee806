// Colored terminal output for matrices, topics and corpus overviews.
//
// This module handles all terminal-specific formatting. The main.rs
// command handlers delegate here.

use colored::Colorize;

use super::report::{CellReport, MatrixReport};
use super::truncate_chars;
use crate::facets::TableManager;
use crate::search::corpus::CorpusStats;
use crate::summary::{Ranked, NOT_DEFINED};
use crate::topics::TopicExtractor;

/// Display every cell's summary for `field`.
pub fn display_matrix(report: &MatrixReport, field: &str, sentences: usize, terms: usize) {
    println!(
        "\n{}",
        format!(
            "=== {} x {} ({} x {} cells) ===",
            report.row_dimension,
            report.col_dimension,
            report.rows.len(),
            report.cols.len()
        )
        .bold()
    );
    if report.global_filter != "*:*" {
        println!("  Filter: {}", report.global_filter.dimmed());
    }

    for cell in &report.cells {
        display_cell(cell, field, sentences, terms);
    }
    println!();

    let empty = report.cells.iter().filter(|c| c.documents == 0).count();
    if empty > 0 {
        println!("  {} {} empty cells", "~".yellow(), empty);
    }
}

fn display_cell(cell: &CellReport, field: &str, sentences: usize, terms: usize) {
    println!(
        "\n  {} {} {}  {}",
        cell.row.bold(),
        "x".dimmed(),
        cell.col.bold(),
        format!("({} documents)", cell.documents).dimmed()
    );

    let Some(summary) = cell.summaries.as_ref().and_then(|s| s.field(field)) else {
        println!("    {}", "no summary".dimmed());
        return;
    };
    if summary.is_sentinel() {
        println!("    {}", NOT_DEFINED.dimmed());
        return;
    }

    if !cell.topics.is_empty() {
        let topics: Vec<String> = cell
            .topics
            .iter()
            .map(|t| format!("{} ({:.2})", t.label, t.weight))
            .collect();
        println!("    Topics: {}", topics.join(", ").cyan());
    }
    println!("    Terms: {}", join_terms(&summary.top_terms, terms));
    println!(
        "    Topic terms: {}",
        join_terms(&summary.top_terms_of_topics, terms).cyan()
    );
    if let Some(related) = &cell.related_terms {
        println!("    Related: {}", join_terms(related, terms).dimmed());
    }
    if let Some(score) = cell.ngram_score {
        println!("    Typicality: {score:.2}");
    }
    for (i, sentence) in summary.top_sentences.iter().take(sentences).enumerate() {
        println!(
            "    {}. [{:.2}] {}",
            i + 1,
            sentence.score,
            truncate_chars(&sentence.text, 140)
        );
    }
}

fn join_terms(terms: &[Ranked], limit: usize) -> String {
    terms
        .iter()
        .take(limit)
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display the trained topics and each cell's mixture.
pub fn display_topics(table: &TableManager, topics: &TopicExtractor, terms: usize) {
    println!(
        "\n{}",
        format!(
            "=== Topics ({}, {} groups) ===",
            topics.strategy(),
            topics.groups().len()
        )
        .bold()
    );

    for group in topics.groups() {
        println!(
            "\n  {}  {}",
            group.label.bold(),
            format!("({} texts)", group.documents).dimmed()
        );
        if group.topics.is_empty() {
            println!("    {}", "no topics".dimmed());
            continue;
        }
        for (i, topic) in group.topics.iter().enumerate() {
            let words: Vec<String> = topic
                .top_terms(terms)
                .iter()
                .map(|(t, p)| format!("{t} ({p:.2})"))
                .collect();
            println!("    {}. {}", i + 1, words.join(", "));
        }
    }

    println!("\n{}", "=== Cell mixtures ===".bold());
    for cell in table.cells() {
        let mixture: Vec<String> = cell
            .topic_mixture()
            .iter()
            .map(|s| format!("{} {:.2}", s.topic.label, s.weight))
            .collect();
        let mixture = if mixture.is_empty() {
            "-".dimmed().to_string()
        } else {
            mixture.join(" | ")
        };
        println!(
            "  {:<12} {:<12} {:>5}  {}",
            cell.row_label(),
            cell.col_label(),
            cell.documents().len(),
            mixture
        );
    }
    println!();
}

/// Display a corpus overview.
pub fn display_stats(stats: &CorpusStats, max_values: usize) {
    println!(
        "\n{}",
        format!("=== Corpus ({} documents) ===", stats.documents).bold()
    );
    match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => println!("  Dates: {first} to {last}"),
        _ => println!("  Dates: {}", "none".dimmed()),
    }
    let fields: Vec<&str> = stats.fields.iter().map(String::as_str).collect();
    println!("  Text fields: {}", fields.join(", "));

    for (facet, counts) in &stats.facets {
        let mut values: Vec<(&String, &usize)> = counts.iter().collect();
        values.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        println!(
            "\n  {} {}",
            facet.bold(),
            format!("({} values)", values.len()).dimmed()
        );
        for (value, count) in values.into_iter().take(max_values) {
            println!("    {:<24} {:>6}", value, count);
        }
    }
    println!();
}
