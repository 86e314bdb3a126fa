//! Debug tool: Print spans per column with font, weight and size
//!
//! Usage: debug_spans <pdf_path> [page | min-max]
//!
//! Useful for choosing the size buckets of a new glossary layout.

use glossary_extract::layout::page_lines;
use glossary_extract::{extract_page_spans, ExtractionConfig};
use std::collections::BTreeMap;
use std::env;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_spans <pdf_path> [page | min-max]");
        process::exit(1);
    }

    let range = args.get(2).map(|s| s.as_str()).unwrap_or("1-3");
    let (min_page, max_page) = if let Some((a, b)) = range.split_once('-') {
        (a.parse().unwrap_or(1), b.parse().unwrap_or(3))
    } else {
        let page = range.parse().unwrap_or(1);
        (page, page)
    };

    let pages = match extract_page_spans(&args[1]) {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("Error extracting spans: {}", e);
            process::exit(1);
        }
    };

    // Show how the size-bucketed preset would read each span
    let size_policy = ExtractionConfig::rivstart_third_edition().policy;
    let mut size_counts: BTreeMap<i32, usize> = BTreeMap::new();

    for page in pages
        .iter()
        .filter(|p| p.page >= min_page && p.page <= max_page)
    {
        println!(
            "=== PAGE {} ({:.0}x{:.0}, {} spans) ===",
            page.page,
            page.bounds.width(),
            page.bounds.height(),
            page.spans.len()
        );
        for line in page_lines(page) {
            println!("  [{:?} y={:7.1}]", line.column, line.y);
            for span in &line.spans {
                if let Some(size) = span.font_size {
                    *size_counts.entry((size * 10.0).round() as i32).or_insert(0) += 1;
                }
                println!(
                    "    x={:7.1} fs={:>5} {} {:<10} font={:<24} text={:?}",
                    span.x,
                    span.font_size
                        .map(|s| format!("{:.1}", s))
                        .unwrap_or_else(|| "-".to_string()),
                    if span.is_bold { "B" } else { " " },
                    format!("{:?}", size_policy.classify(span)),
                    span.font,
                    span.text
                );
            }
        }
        println!();
    }

    println!("=== FONT SIZES ===");
    for (size_key, count) in size_counts {
        println!("  {:5.1}pt: {}", size_key as f32 / 10.0, count);
    }
}
