use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::time::Duration;
use watchfinder::collector::{CollectOptions, Collector, DEFAULT_MAX_PAGES};
use watchfinder::detail::scrape_offer_details;
use watchfinder::fetcher::{HttpFetcher, DEFAULT_TIMEOUT_SECS};
use watchfinder::gallery::{render_gallery_sections, GallerySection, DEFAULT_BATCH_SIZE, DEFAULT_CURRENCY};
use watchfinder::models::SearchQuery;
use watchfinder::output::{write_report, OutputFormat, QueryReport};
use watchfinder::tui::ScraperTUI;
use watchfinder::debug;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Watchfinder - Watch resale offer search")]
struct Args {
    /// Enable debug output
    #[clap(short, long, global = true)]
    debug: bool,

    /// Request timeout in seconds
    #[clap(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search offers for one or more watch models
    Search {
        /// Query as key=value pairs, e.g. "brand=Rolex,model=Submariner,size=38-41,material=steel,condition=used"
        #[clap(short, long = "query", required = true)]
        queries: Vec<SearchQuery>,

        /// Price ceiling applied to every query
        #[clap(short = 'p', long, value_parser = clap::value_parser!(u64).range(1..))]
        max_price: Option<u64>,

        /// Maximum number of offers shown per query
        #[clap(short = 'n', long, default_value_t = 12)]
        max_results: usize,

        /// Maximum number of pages to fetch per query
        #[clap(short, long, default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: u32,

        /// Keep offers whose title does not contain the model name
        #[clap(long)]
        no_name_filter: bool,

        /// Show what was collected before a failing page instead of aborting
        #[clap(long)]
        allow_partial: bool,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write an HTML image gallery to this path
        #[clap(short, long)]
        gallery: Option<String>,

        /// Offers per gallery row
        #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Print the attribute table of a single offer page
    Detail {
        /// Offer url
        url: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    debug::init_logging(args.debug);

    if args.timeout == 0 {
        bail!("Timeout must be at least one second");
    }
    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout))?;

    match args.command {
        Command::Search {
            queries,
            max_price,
            max_results,
            max_pages,
            no_name_filter,
            allow_partial,
            format,
            gallery,
            batch_size,
        } => {
            let options = CollectOptions {
                max_pages,
                filter_by_name: !no_name_filter,
            };
            let collector = Collector::new(fetcher);
            let mut reports = Vec::new();

            // Banner and progress go to stderr, stdout carries only the report
            eprintln!("Watchfinder - Watch resale offer search");
            eprintln!("=======================================");

            for mut query in queries {
                // The global budget overrides per-query ceilings
                if max_price.is_some() {
                    query.max_price = max_price;
                }

                let mut tui = ScraperTUI::new();
                let results = match collector.collect(&query, &options, Some(&mut tui)) {
                    Ok(results) => results,
                    Err(e) if allow_partial => {
                        eprintln!("Warning: {} - showing {} offers collected before the failure", e, e.partial.len());
                        e.partial
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("Search for {} failed", query.label()));
                    }
                };

                reports.push(QueryReport {
                    query: query.label(),
                    total: results.len(),
                    offers: results.truncated(max_results),
                });
            }

            // One document for all queries
            write_report(&reports, format, io::stdout().lock())?;

            if let Some(path) = gallery {
                let sections: Vec<GallerySection> = reports
                    .into_iter()
                    .map(|report| GallerySection {
                        title: report.query,
                        results: report.offers,
                    })
                    .collect();
                let html = render_gallery_sections(&sections, batch_size, DEFAULT_CURRENCY);
                fs::write(&path, html).with_context(|| format!("Failed to write gallery: {}", path))?;
                eprintln!("Gallery saved to: {}", path);
            }
        }
        Command::Detail { url } => {
            let details = scrape_offer_details(&fetcher, &url)?;
            if details.attributes.is_empty() {
                println!("No attributes found on {}", url);
            }
            for (label, value) in &details.attributes {
                println!("{}: {}", label, value);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_price() {
        let result = Args::try_parse_from(["watchfinder", "search", "-q", "brand=Rolex,model=Submariner", "--max-price", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_search_with_several_queries() {
        let args = Args::try_parse_from([
            "watchfinder",
            "search",
            "-q",
            "brand=Rolex,model=Submariner",
            "-q",
            "brand=Omega,model=Seamaster,material=steel",
            "--max-price",
            "5000",
            "--format",
            "json",
        ])
        .unwrap();

        match args.command {
            Command::Search { queries, max_price, format, .. } => {
                assert_eq!(queries.len(), 2);
                assert_eq!(queries[1].brand, "Omega");
                assert_eq!(max_price, Some(5000));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
