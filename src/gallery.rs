use crate::models::ResultSet;
use html_escape::{encode_double_quoted_attribute, encode_text};

pub const DEFAULT_BATCH_SIZE: usize = 4;
pub const DEFAULT_CURRENCY: &str = "R$";
const NAME_PREVIEW_CHARS: usize = 30;

/// Results of one search, shown under its own heading.
#[derive(Debug, Clone)]
pub struct GallerySection {
    pub title: String,
    pub results: ResultSet,
}

/// Renders offers as an HTML page of image cards, `batch_size` cards per row.
/// Each card links to the listing and shows price and a shortened name.
pub fn render_gallery(results: &ResultSet, batch_size: usize, currency: &str) -> String {
    let mut html = document_start();
    push_cards(&mut html, results, batch_size, currency);
    html.push_str(DOCUMENT_END);
    html
}

/// Like `render_gallery`, with one titled block per section.
pub fn render_gallery_sections(sections: &[GallerySection], batch_size: usize, currency: &str) -> String {
    let mut html = document_start();
    for section in sections {
        html.push_str(&format!("<h2>{}</h2>\n", encode_text(&section.title)));
        if section.results.is_empty() {
            html.push_str("<p>No offers found.</p>\n");
        }
        push_cards(&mut html, &section.results, batch_size, currency);
    }
    html.push_str(DOCUMENT_END);
    html
}

const DOCUMENT_END: &str = "</body>\n</html>\n";

fn document_start() -> String {
    String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Watch offers</title>\n</head>\n<body>\n",
    )
}

fn push_cards(html: &mut String, results: &ResultSet, batch_size: usize, currency: &str) {
    for row in results.offers().chunks(batch_size.max(1)) {
        html.push_str("<div style=\"display: flex; align-items: flex-start;\">\n");
        for offer in row {
            let name: String = offer.name.chars().take(NAME_PREVIEW_CHARS).collect();
            html.push_str(&format!(
                concat!(
                    "  <div style=\"flex: 1; margin-right: 10px;\">\n",
                    "    <a href=\"{url}\" target=\"_blank\">\n",
                    "      <img src=\"{image}\" style=\"height: 200px; width: auto\" />\n",
                    "    </a>\n",
                    "    <div style=\"margin-top: 10px;\">\n",
                    "      <p>{currency}{price}, {name}</p>\n",
                    "    </div>\n",
                    "  </div>\n",
                ),
                url = encode_double_quoted_attribute(&offer.url),
                image = encode_double_quoted_attribute(&offer.image),
                currency = encode_text(currency),
                price = offer.price,
                name = encode_text(&name),
            ));
        }
        html.push_str("</div>\n");
    }
}
