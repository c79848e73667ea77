use crossterm::{
    cursor::MoveToPreviousLine,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io;

/// Progress lines for a collection run, one per fetched page. Written to
/// stderr so stdout only carries the report.
pub struct ScraperTUI {
    label: String,
    max_pages: u32,
    pages_done: u32,
    total_offers: usize,
    status_line_printed: bool,
}

impl ScraperTUI {
    pub fn new() -> Self {
        Self {
            label: String::new(),
            max_pages: 0,
            pages_done: 0,
            total_offers: 0,
            status_line_printed: false,
        }
    }

    pub fn start_collection(&mut self, label: &str, max_pages: u32) -> io::Result<()> {
        self.label = label.to_string();
        self.max_pages = max_pages;
        self.pages_done = 0;
        self.total_offers = 0;
        execute!(
            io::stderr(),
            SetForegroundColor(Color::White),
            Print(format!("🔎 Searching {} (up to {} pages)\n", label, max_pages)),
            ResetColor
        )?;
        self.print_status()
    }

    pub fn update_page_progress(&mut self, page: u32, found: usize, added: usize, total: usize) -> io::Result<()> {
        self.pages_done += 1;
        self.total_offers = total;

        self.clear_status()?;

        let color = if added > 0 { Color::Green } else { Color::DarkGrey };
        execute!(
            io::stderr(),
            SetForegroundColor(color),
            Print(format!(
                "  page {:>3}: {} offers, {} new ({} total)\n",
                page, found, added, total
            )),
            ResetColor
        )?;

        self.print_status()
    }

    pub fn finish_collection(&mut self, total: usize) -> io::Result<()> {
        self.clear_status()?;
        execute!(
            io::stderr(),
            SetForegroundColor(Color::Green),
            Print(format!(
                "✓ {}: {} unique offers from {} pages\n",
                self.label, total, self.pages_done
            )),
            ResetColor
        )
    }

    pub fn report_failure(&mut self, page: u32, message: &str) -> io::Result<()> {
        self.clear_status()?;
        execute!(
            io::stderr(),
            SetForegroundColor(Color::Red),
            Print(format!("✗ {}: page {} failed: {}\n", self.label, page, message)),
            ResetColor
        )
    }

    fn print_status(&mut self) -> io::Result<()> {
        let spinner = match self.pages_done % 4 {
            0 => "⠋",
            1 => "⠙",
            2 => "⠹",
            _ => "⠸",
        };
        execute!(
            io::stderr(),
            SetForegroundColor(Color::White),
            Print(format!(
                "{} Collecting ({}/{} pages) - {} offers\n",
                spinner, self.pages_done, self.max_pages, self.total_offers
            )),
            ResetColor
        )?;
        self.status_line_printed = true;
        Ok(())
    }

    fn clear_status(&mut self) -> io::Result<()> {
        if self.status_line_printed {
            execute!(io::stderr(), MoveToPreviousLine(1), Clear(ClearType::CurrentLine))?;
            self.status_line_printed = false;
        }
        Ok(())
    }
}

impl Default for ScraperTUI {
    fn default() -> Self {
        Self::new()
    }
}
