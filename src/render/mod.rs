//! Plain-text presentation of the session
//!
//! Everything here returns strings; the caller decides where they go.

use crate::config::DisplayConfig;
use crate::session::{HighlightedResult, RepoState, SearchState};
use crate::tree::{FileTreeView, NodeKind};
use crate::types::{RepositoryMetadata, SearchModelId};
use std::fmt::Write;

/// Renders session state according to the `[display]` config
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    display: DisplayConfig,
}

impl Renderer {
    pub fn new(display: DisplayConfig) -> Self {
        Self { display }
    }

    /// One-line summary of the repository session
    pub fn status(&self, state: &RepoState) -> String {
        match state {
            RepoState::Empty => "No repository loaded. Paste a repository URL to begin.".to_string(),
            RepoState::Loading { url } => format!("Indexing {} ...", url),
            RepoState::Loaded(repo) => format!("Browsing {}", repo.metadata.full_name()),
        }
    }

    pub fn header(&self, metadata: &RepositoryMetadata) -> String {
        let mut out = format!("{} / {}\n", metadata.owner, metadata.name);
        if !metadata.description.is_empty() {
            let _ = writeln!(out, "{}", metadata.description);
        }
        let _ = write!(
            out,
            "★ {} Stars   ⑂ {} Forks",
            group_thousands(metadata.star_count),
            group_thousands(metadata.fork_count)
        );
        if let Some(branch) = &metadata.default_branch {
            let _ = write!(out, "   ⎇ {}", branch);
        }
        out
    }

    /// Explorer rows with their addresses, preorder, collapsed folders closed
    pub fn tree(&self, tree: &FileTreeView) -> String {
        let rows = tree.visible_rows();
        if rows.is_empty() {
            return "(empty repository)".to_string();
        }

        let width = rows
            .iter()
            .map(|row| row.path.to_string().len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for row in rows {
            let glyph = match (row.kind, row.expanded) {
                (NodeKind::File, _) => "📄",
                (NodeKind::Folder, true) => "📂",
                (NodeKind::Folder, false) => "📁",
            };
            let _ = writeln!(
                out,
                "{:>width$}  {}{} {}",
                row.path.to_string(),
                "  ".repeat(row.depth),
                glyph,
                row.name,
                width = width
            );
        }
        out.truncate(out.trim_end().len());
        out
    }

    pub fn models(&self, selected: SearchModelId) -> String {
        SearchModelId::ALL
            .iter()
            .map(|model| {
                let mark = if *model == selected { "*" } else { " " };
                format!("{} {:<9} {}", mark, model.as_wire(), model.label())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Busy indicator, empty-state notice, or the result cards
    pub fn search(&self, state: &SearchState) -> String {
        if state.busy {
            return format!("Searching with {} ...", state.model.label());
        }
        if state.results.is_empty() {
            if state.query.trim().is_empty() {
                return "Ask a question (e.g. 'How do we handle login errors?')".to_string();
            }
            return format!("No results for '{}'.", state.query.trim());
        }

        state
            .results
            .iter()
            .map(|result| self.result_card(result))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn result_card(&self, item: &HighlightedResult) -> String {
        let result = &item.result;
        let mut out = format!(
            "📄 {} [{}]  Match: {}%\n",
            result.filename,
            result.source_model,
            result.score_percent()
        );

        let lines: Vec<&str> = result.code.lines().collect();
        let shown = match self.display.max_code_lines {
            0 => lines.len(),
            max => lines.len().min(max),
        };
        let number_width = shown.to_string().len();
        let blank_marker = " ".repeat(self.display.highlight_marker.chars().count());

        for (index, line) in lines.iter().take(shown).enumerate() {
            let number = index + 1;
            let marker = if item.lines.contains(&number) {
                self.display.highlight_marker.as_str()
            } else {
                blank_marker.as_str()
            };

            if self.display.show_line_numbers {
                let _ = writeln!(
                    out,
                    "{} {:>width$} │ {}",
                    marker,
                    number,
                    line,
                    width = number_width
                );
            } else {
                let _ = writeln!(out, "{} {}", marker, line);
            }
        }

        if shown < lines.len() {
            let _ = writeln!(out, "  ... {} more lines", lines.len() - shown);
        }

        out.truncate(out.trim_end_matches('\n').len());
        out
    }
}

/// 68000 -> "68,000"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
