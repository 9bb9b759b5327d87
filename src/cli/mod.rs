//! CLI argument definitions and interactive command parsing
use crate::tree::NodePath;
use crate::types::SearchModelId;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "smartgrep",
    version,
    author = "neur0map",
    about = "Interactive code search over an indexed repository",
    long_about = "Smartgrep loads a repository through the indexing backend, lets you browse its file \
                  tree, and answers free-text questions with ranked code snippets from a lexical, \
                  dense-embedding or cross-encoder retrieval model."
)]
pub struct Cli {
    /// Config file path (defaults to ~/.config/smartgrep/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Indexing backend base URL, overriding the config file
    #[arg(long, value_name = "URL")]
    pub gateway_url: Option<String>,

    /// Initially selected retrieval model (bm25, minilm, codebert)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<SearchModelId>,

    /// Repository URL to load on start-up
    pub repository: Option<String>,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// One line typed at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `load <url>`
    Load(String),
    /// `tree`
    Tree,
    /// `open <path>`: toggle a folder
    Toggle(NodePath),
    /// `collapse`
    Collapse,
    /// `models`
    Models,
    /// `model <id>`
    Model(SearchModelId),
    /// `search <text>`
    Search(String),
    /// `results`
    Results,
    /// `change`
    Change,
    /// `status`
    Status,
    Help,
    Quit,
    /// Anything that is not a command: a URL before a repository is loaded, a query after
    Text(String),
    /// Blank line
    Nothing,
}

pub const HELP: &str = "\
Commands:
  load <url>        index a repository (or just paste the URL)
  tree              show the explorer
  open <path>       open/close a folder, e.g. `open 2.1`
  collapse          close every folder
  models            list retrieval models
  model <id>        select bm25, minilm or codebert
  search <text>     run a query (or just type it)
  results           show the current results
  change            drop the repository and pick another
  status            show what the session is doing
  help              this text
  quit              leave";

impl Command {
    /// Parse one prompt line. Errors are operator-facing messages.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Nothing);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "load" if !rest.is_empty() => Command::Load(rest.to_string()),
            "load" => return Err("Usage: load <repository url>".to_string()),
            "tree" if rest.is_empty() => Command::Tree,
            "open" | "toggle" if rest.is_empty() => {
                return Err("Usage: open <path>, e.g. `open 2.1`".to_string())
            }
            "open" | "toggle" => match rest.parse::<NodePath>() {
                Ok(path) => Command::Toggle(path),
                Err(_) => Command::Text(line.to_string()),
            },
            "collapse" if rest.is_empty() => Command::Collapse,
            "models" if rest.is_empty() => Command::Models,
            "model" if rest.is_empty() => {
                return Err("Usage: model <bm25|minilm|codebert>".to_string())
            }
            "model" => match rest.parse::<SearchModelId>() {
                Ok(model) => Command::Model(model),
                Err(_) => Command::Text(line.to_string()),
            },
            "search" if !rest.is_empty() => Command::Search(rest.to_string()),
            "search" => return Err("Usage: search <question>".to_string()),
            "results" if rest.is_empty() => Command::Results,
            "change" if rest.is_empty() => Command::Change,
            "status" if rest.is_empty() => Command::Status,
            "help" | "?" if rest.is_empty() => Command::Help,
            "quit" | "exit" | "q" if rest.is_empty() => Command::Quit,
            _ => Command::Text(line.to_string()),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_model_flag() {
        let cli = Cli::try_parse_from(["smartgrep", "--model", "codebert", "https://github.com/a/b"])
            .unwrap();
        assert_eq!(cli.model, Some(SearchModelId::CrossEncoderRerank));
        assert_eq!(cli.repository.as_deref(), Some("https://github.com/a/b"));

        assert!(Cli::try_parse_from(["smartgrep", "--model", "tfidf"]).is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  "), Ok(Command::Nothing));
        assert_eq!(Command::parse("tree"), Ok(Command::Tree));
        assert_eq!(
            Command::parse("open 2.1"),
            Ok(Command::Toggle(NodePath::new(vec![1, 0])))
        );
        assert_eq!(
            Command::parse("MODEL bm25"),
            Ok(Command::Model(SearchModelId::Lexical))
        );
        assert_eq!(
            Command::parse("search how do we handle login errors?"),
            Ok(Command::Search("how do we handle login errors?".to_string()))
        );
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("open").is_err());
        assert!(Command::parse("model").is_err());
        assert!(Command::parse("load").is_err());
    }

    #[test]
    fn test_free_text() {
        assert_eq!(
            Command::parse("https://github.com/pallets/flask"),
            Ok(Command::Text("https://github.com/pallets/flask".to_string()))
        );
        // Arguments that are not a path or a model make the line a question
        assert_eq!(
            Command::parse("open file handles leak"),
            Ok(Command::Text("open file handles leak".to_string()))
        );
        assert_eq!(
            Command::parse("model training loop"),
            Ok(Command::Text("model training loop".to_string()))
        );
        assert_eq!(
            Command::parse("open 0.1"),
            Ok(Command::Text("open 0.1".to_string()))
        );
        // A command word followed by unexpected text is treated as a question
        assert_eq!(
            Command::parse("tree shaking in webpack"),
            Ok(Command::Text("tree shaking in webpack".to_string()))
        );
    }
}
