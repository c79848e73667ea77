use crate::models::ResultSet;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Shown offers of one query. `total` counts offers before the result cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub total: usize,
    pub offers: ResultSet,
}

/// Writes all query results as one document: a single CSV table with a
/// query column, a single JSON array, or one titled table per query.
pub fn write_report<W: Write>(reports: &[QueryReport], format: OutputFormat, mut writer: W) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    writeln!(writer)?;
                }
                writeln!(
                    writer,
                    "=== {} ({} of {} offers) ===",
                    report.query,
                    report.offers.len(),
                    report.total
                )?;
                write_table(&report.offers, &mut writer)?;
            }
            Ok(())
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            csv_writer.write_record(["Query", "Price", "Name", "URL", "Image", "Page"])?;
            for report in reports {
                for offer in &report.offers {
                    csv_writer.write_record([
                        report.query.clone(),
                        offer.price.to_string(),
                        offer.name.clone(),
                        offer.url.clone(),
                        offer.image.clone(),
                        offer.page.to_string(),
                    ])?;
                }
            }
            csv_writer.flush().context("Failed to flush CSV output")?;
            Ok(())
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, reports).context("Failed to serialize offers")?;
            writeln!(writer)?;
            Ok(())
        }
    }
}

pub fn write_results<W: Write>(results: &ResultSet, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(results, writer),
        OutputFormat::Csv => write_csv(results, writer),
        OutputFormat::Json => write_json(results, writer),
    }
}

pub fn write_table<W: Write>(results: &ResultSet, mut writer: W) -> Result<()> {
    // widest price decides the first column
    let price_width = results
        .iter()
        .map(|offer| offer.price.to_string().len())
        .max()
        .unwrap_or(0)
        .max("Price".len());

    writeln!(writer, "{:>width$}  {:>4}  Name", "Price", "Page", width = price_width)?;
    for offer in results {
        writeln!(
            writer,
            "{:>width$}  {:>4}  {}",
            offer.price,
            offer.page,
            offer.name,
            width = price_width
        )?;
        writeln!(writer, "{:>width$}        {}", "", offer.url, width = price_width)?;
    }
    Ok(())
}

pub fn write_csv<W: Write>(results: &ResultSet, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["Price", "Name", "URL", "Image", "Page"])?;
    for offer in results {
        csv_writer.write_record([
            offer.price.to_string(),
            offer.name.clone(),
            offer.url.clone(),
            offer.image.clone(),
            offer.page.to_string(),
        ])?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_json<W: Write>(results: &ResultSet, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, results).context("Failed to serialize offers")?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Offer;
    use pretty_assertions::assert_eq;

    fn results() -> ResultSet {
        vec![
            Offer {
                url: "https://www.chrono24.com.br/rolex/id1.htm".to_string(),
                name: "Rolex Submariner, Date".to_string(),
                price: 45000,
                image: String::new(),
                page: 1,
            },
            Offer {
                url: "https://www.chrono24.com.br/rolex/id2.htm".to_string(),
                name: "Rolex Submariner".to_string(),
                price: 52000,
                image: "https://img.example/2.jpg".to_string(),
                page: 2,
            },
        ]
        .into_iter()
        .collect()
    }

    fn reports() -> Vec<QueryReport> {
        vec![
            QueryReport { query: "Rolex Submariner".to_string(), total: 5, offers: results() },
            QueryReport { query: "Omega Seamaster".to_string(), total: 0, offers: ResultSet::new() },
        ]
    }

    #[test]
    fn csv_quotes_names_with_commas() {
        let mut buffer = Vec::new();
        write_csv(&results(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Price,Name,URL,Image,Page");
        assert_eq!(lines[1], "45000,\"Rolex Submariner, Date\",https://www.chrono24.com.br/rolex/id1.htm,,1");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn json_is_an_array_of_offers() {
        let mut buffer = Vec::new();
        write_json(&results(), &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["page"], 2);
    }

    #[test]
    fn table_lists_every_offer() {
        let mut buffer = Vec::new();
        write_results(&results(), OutputFormat::Table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("Price  Page  Name"));
        assert!(text.contains("45000     1  Rolex Submariner, Date"));
        assert!(text.contains("id2.htm"));
    }

    #[test]
    fn json_report_for_several_queries_is_one_document() {
        let mut buffer = Vec::new();
        write_report(&reports(), OutputFormat::Json, &mut buffer).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let queries = value.as_array().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0]["query"], "Rolex Submariner");
        assert_eq!(queries[0]["total"], 5);
        assert_eq!(queries[0]["offers"].as_array().map(Vec::len), Some(2));
        assert_eq!(queries[1]["offers"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn csv_report_has_one_header_and_a_query_column() {
        let mut buffer = Vec::new();
        write_report(&reports(), OutputFormat::Csv, &mut buffer).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("Query"));

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.get(0) == Some("Rolex Submariner")));
        assert_eq!(rows[0].get(1), Some("45000"));
    }

    #[test]
    fn table_report_titles_each_query() {
        let mut buffer = Vec::new();
        write_report(&reports(), OutputFormat::Table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("=== Rolex Submariner (2 of 5 offers) ===\n"));
        assert!(text.contains("\n=== Omega Seamaster (0 of 0 offers) ===\n"));
    }
}
