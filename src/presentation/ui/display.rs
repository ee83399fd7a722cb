use colored::Colorize;
use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::domain::value_objects::{history_verdict::HistoryVerdict, reconcile_method::ReconcileMethod};

/// Display utilities for the CLI interface
pub struct DisplayHelper {
    pub use_color: bool,
    pub terminal: Term,
}

impl DisplayHelper {
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            terminal: Term::stdout(),
        }
    }

    /// Color only when requested and stdout is a terminal.
    pub fn auto(no_color: bool) -> Self {
        let terminal = Term::stdout();
        let use_color =
            !no_color && terminal.is_term() && std::env::var_os("NO_COLOR").is_none();
        Self {
            use_color,
            terminal,
        }
    }

    pub fn success(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("[SUCCESS] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "✗".red().bold(), message);
        } else {
            eprintln!("[ERROR] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "⚠".yellow().bold(), message);
        } else {
            println!("[WARNING] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "::".blue().bold(), message);
        } else {
            println!("[INFO] {}", message);
        }
    }

    pub fn section_header(&self, title: &str) {
        if self.use_color {
            println!("\n{}", title.bold().underline());
        } else {
            println!("\n=== {} ===", title);
        }
    }

    pub fn format_path(&self, path: &str) -> String {
        if self.use_color {
            path.cyan().to_string()
        } else {
            format!("'{}'", path)
        }
    }

    pub fn format_method(&self, method: ReconcileMethod) -> String {
        if !self.use_color {
            return method.label().to_string();
        }
        match method {
            ReconcileMethod::History => method.label().green().to_string(),
            ReconcileMethod::Fallback => method.label().yellow().to_string(),
        }
    }

    pub fn format_status(&self, status: &str, ok: bool) -> String {
        match (self.use_color, ok) {
            (false, _) => status.to_string(),
            (true, true) => status.green().bold().to_string(),
            (true, false) => status.red().bold().to_string(),
        }
    }

    pub fn print_verdict(&self, verdict: &HistoryVerdict) {
        if verdict.is_clean() {
            self.success(&format!("History is clean: {}", verdict.reason()));
        } else {
            self.warning(&format!("History is not clean: {}", verdict.reason()));
        }
    }

    /// Progress bar drawn only in color mode.
    pub fn create_progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        if !self.use_color {
            return ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden());
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>4}/{len:4} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(message.to_string());
        pb
    }

    pub fn print_table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if rows.is_empty() {
            return;
        }

        let mut col_widths = headers.iter().map(|h| h.len()).collect::<Vec<_>>();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < col_widths.len() {
                    col_widths[i] = col_widths[i].max(console::measure_text_width(cell));
                }
            }
        }

        let header_line = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:<width$}", h, width = col_widths[i]))
            .collect::<Vec<_>>()
            .join("  ");
        if self.use_color {
            println!("{}", header_line.bold());
        } else {
            println!("{}", header_line);
        }

        let rule = if self.use_color { "─" } else { "-" };
        println!(
            "{}",
            col_widths
                .iter()
                .map(|w| rule.repeat(*w))
                .collect::<Vec<_>>()
                .join("  ")
        );

        for row in rows {
            let line = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let width = col_widths.get(i).copied().unwrap_or(0);
                    console::pad_str(cell, width, console::Alignment::Left, None).into_owned()
                })
                .collect::<Vec<_>>()
                .join("  ");
            println!("{}", line.trim_end());
        }
    }

    pub fn print_indented(&self, message: &str, level: usize) {
        println!("{}{}", "  ".repeat(level), message);
    }

    pub fn print_summary(&self, title: &str, items: &[(String, String)]) {
        if self.use_color {
            println!("\n┌─ {} ─┐", title.bold());
            for (key, value) in items {
                println!("│ {}: {}", key.bold(), value);
            }
            println!("└{:─<width$}┘", "", width = title.len() + 4);
        } else {
            println!("\n=== {} ===", title);
            for (key, value) in items {
                println!("{}: {}", key, value);
            }
            println!("{}", "=".repeat(title.len() + 8));
        }
    }
}
