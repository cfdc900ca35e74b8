//! Terminal output for the medrec CLI.
//!
//! Every status line is a [`Mark`] plus a message; colors are dropped with
//! `--no-color` in favour of bracketed labels.

use owo_colors::OwoColorize;

/// Outcome shown in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Done,
    Skipped,
    Warning,
    Failed,
}

impl Mark {
    fn label(self) -> &'static str {
        match self {
            Mark::Done => "[OK]",
            Mark::Skipped => "[SKIP]",
            Mark::Warning => "[WARN]",
            Mark::Failed => "[ERROR]",
        }
    }

    fn symbol(self) -> String {
        match self {
            Mark::Done => "✓".green().bold().to_string(),
            Mark::Skipped => "○".yellow().to_string(),
            Mark::Warning => "!".yellow().bold().to_string(),
            Mark::Failed => "✗".red().bold().to_string(),
        }
    }
}

pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = env!("CARGO_PKG_VERSION");
        if self.colored {
            println!(
                "\n   {} {}  {}\n",
                "medrec".bright_cyan().bold(),
                format!("v{version}").dimmed(),
                "health records server".dimmed(),
            );
        } else {
            println!("\n   medrec v{version}  health records server\n");
        }
    }

    pub fn section(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold());
        } else {
            println!("\n  {title}:");
        }
    }

    /// Formats one status line without printing it.
    pub fn render(&self, mark: Mark, message: &str) -> String {
        if self.colored {
            format!("  {} {}", mark.symbol(), message)
        } else {
            format!("  {} {}", mark.label(), message)
        }
    }

    /// Prints a status line; failures go to stderr.
    pub fn mark(&self, mark: Mark, message: &str) {
        let line = self.render(mark, message);
        match mark {
            Mark::Failed => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    /// `[2/3] Applying migrations` style progress for commands with a fixed
    /// number of phases.
    pub fn progress(&self, step: u32, total: u32, message: &str) {
        let counter = format!("[{step}/{total}]");
        if self.colored {
            println!("  {} {}", counter.dimmed(), message);
        } else {
            println!("  {counter} {message}");
        }
    }

    /// Key/value block with keys padded to a common width.
    pub fn settings(&self, pairs: &[(&str, String)]) {
        let width = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in pairs {
            if self.colored {
                println!("    {} {}", format!("{key:<width$}").dimmed(), value);
            } else {
                println!("    {key:<width$} {value}");
            }
        }
    }

    /// Numbered follow-up instructions, each with the shell commands to run.
    pub fn next_steps(&self, steps: &[(&str, &[&str])]) {
        self.section("Next steps");
        for (n, (what, commands)) in steps.iter().enumerate() {
            println!("\n  {}. {}", n + 1, what);
            for cmd in *commands {
                if self.colored {
                    println!("     {}", format!("$ {cmd}").cyan());
                } else {
                    println!("     $ {cmd}");
                }
            }
        }
        println!();
    }
}
