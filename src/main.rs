use smartgrep::cli::{Cli, Command, HELP};
use smartgrep::client::{Client, Update};
use smartgrep::config::{Config, ConfigValidator};
use smartgrep::error::{Result, SmartgrepError};
use smartgrep::gateway::{HttpGateway, IndexGateway};
use smartgrep::render::Renderer;
use std::io::Write;
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Logs go to stderr; stdout is the interface
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.gateway_url {
        config.gateway.base_url = url;
    }
    if let Some(model) = cli.model {
        config.search.default_model = model;
    }
    ConfigValidator::validate(&config)?;

    tracing::debug!("Using indexing backend at {}", config.gateway.base_url);

    // One thread: gateway calls are local tasks settled on this loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SmartgrepError::Io {
            source: e,
            context: "Failed to start async runtime".to_string(),
        })?;
    let local = tokio::task::LocalSet::new();

    let result = local.block_on(&runtime, run(config, cli.repository));

    // A pending stdin read would otherwise hold up shutdown
    drop(local);
    runtime.shutdown_background();

    result
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "smartgrep=debug"
    } else {
        "smartgrep=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: Config, initial_repository: Option<String>) -> Result<()> {
    let gateway = Rc::new(HttpGateway::from_config(&config.gateway)?);
    let mut client = Client::new(gateway, config.search.default_model);
    let renderer = Renderer::new(config.display.clone());

    println!("Smartgrep 🧠  (type `help` for commands)");
    println!("{}", renderer.status(client.session().state()));

    if let Some(url) = initial_repository {
        client.submit_repository(&url);
        println!("{}", renderer.status(client.session().state()));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(&client)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| SmartgrepError::Io {
                    source: e,
                    context: "Failed to read from stdin".to_string(),
                })?;
                let Some(line) = line else {
                    break;
                };
                if !handle_line(&mut client, &renderer, &line) {
                    break;
                }
                prompt(&client)?;
            }
            Some(update) = client.next_update(), if client.has_in_flight() => {
                if update != Update::Discarded {
                    show_update(&client, &renderer, &update);
                    prompt(&client)?;
                }
            }
        }
    }

    Ok(())
}

fn prompt<G: IndexGateway + 'static>(client: &Client<G>) -> Result<()> {
    let session = client.session();
    let label = match session.metadata() {
        Some(metadata) => format!("{} [{}]", metadata.name, session.search().state().model),
        None if session.is_loading() => "indexing".to_string(),
        None => "repo".to_string(),
    };
    print!("{}> ", label);
    std::io::stdout().flush().map_err(|e| SmartgrepError::Io {
        source: e,
        context: "Failed to flush stdout".to_string(),
    })
}

/// Returns false when the operator asked to quit
fn handle_line<G: IndexGateway + 'static>(
    client: &mut Client<G>,
    renderer: &Renderer,
    line: &str,
) -> bool {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(message) => {
            println!("{}", message);
            return true;
        }
    };

    match command {
        Command::Nothing => {}
        Command::Quit => return false,
        Command::Help => println!("{}", HELP),
        Command::Status => {
            println!("{}", renderer.status(client.session().state()));
            if client.session().search().state().busy {
                println!("{}", renderer.search(client.session().search().state()));
            }
        }
        Command::Load(url) => load(client, renderer, &url),
        Command::Change => {
            client.change_repo();
            println!("{}", renderer.status(client.session().state()));
        }
        Command::Tree => match client.session().tree() {
            Some(tree) => println!("{}", renderer.tree(tree)),
            None => println!("{}", renderer.status(client.session().state())),
        },
        Command::Toggle(path) => match client.toggle(&path) {
            Some(_) => {
                if let Some(tree) = client.session().tree() {
                    println!("{}", renderer.tree(tree));
                }
            }
            None => println!("No folder at {}", path),
        },
        Command::Collapse => {
            client.collapse_all();
            if let Some(tree) = client.session().tree() {
                println!("{}", renderer.tree(tree));
            }
        }
        Command::Models => println!("{}", renderer.models(client.session().search().state().model)),
        Command::Model(model) => {
            client.select_model(model);
            println!("Selected {}", model.label());
        }
        Command::Search(query) => search(client, renderer, &query),
        Command::Results => println!("{}", renderer.search(client.session().search().state())),
        Command::Text(text) => {
            if client.session().is_loaded() {
                search(client, renderer, &text);
            } else {
                load(client, renderer, &text);
            }
        }
    }

    true
}

fn load<G: IndexGateway + 'static>(client: &mut Client<G>, renderer: &Renderer, url: &str) {
    if client.session().is_loaded() {
        println!("A repository is already loaded; use `change` first.");
        return;
    }
    client.submit_repository(url);
    println!("{}", renderer.status(client.session().state()));
}

fn search<G: IndexGateway + 'static>(client: &mut Client<G>, renderer: &Renderer, query: &str) {
    if !client.session().is_loaded() {
        println!("{}", renderer.status(client.session().state()));
        return;
    }
    if client.search(query) {
        println!("{}", renderer.search(client.session().search().state()));
    }
}

fn show_update<G: IndexGateway + 'static>(client: &Client<G>, renderer: &Renderer, update: &Update) {
    let session = client.session();
    // Start on a fresh line; the prompt is still showing
    println!();

    match update {
        Update::RepositoryLoaded => {
            if let (Some(metadata), Some(tree)) = (session.metadata(), session.tree()) {
                println!("{}\n", renderer.header(metadata));
                println!("{}", renderer.tree(tree));
            }
        }
        Update::RepositoryFailed(e) => {
            println!("Could not load repository: {}", e);
            println!("{}", renderer.status(session.state()));
        }
        Update::ResultsReady { .. } => {
            println!("{}", renderer.search(session.search().state()));
        }
        Update::QueryFailed(e) => {
            println!("Search failed: {}", e);
        }
        Update::Discarded => {}
    }
}
