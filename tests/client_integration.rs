//! Client integration tests
//!
//! Drives the session core through `Client` with a gateway whose answers are released by the
//! test, so settlement order can be chosen freely.

use smartgrep::client::{Client, Update};
use smartgrep::gateway::{GatewayError, IndexGateway, RepositorySnapshot};
use smartgrep::session::RepoState;
use smartgrep::tree::TreeNode;
use smartgrep::types::{RepositoryMetadata, SearchModelId, SearchResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::oneshot;
use tokio::task::LocalSet;

type RepoReply = Result<RepositorySnapshot, GatewayError>;
type QueryReply = Result<Vec<SearchResult>, GatewayError>;

#[derive(Default)]
struct ScriptedGateway {
    repo_calls: RefCell<Vec<String>>,
    query_calls: RefCell<Vec<(String, SearchModelId)>>,
    repos: RefCell<HashMap<String, oneshot::Receiver<RepoReply>>>,
    queries: RefCell<HashMap<String, oneshot::Receiver<QueryReply>>>,
}

impl ScriptedGateway {
    fn expect_repo(&self, url: &str) -> oneshot::Sender<RepoReply> {
        let (tx, rx) = oneshot::channel();
        self.repos.borrow_mut().insert(url.to_string(), rx);
        tx
    }

    fn expect_query(&self, query: &str) -> oneshot::Sender<QueryReply> {
        let (tx, rx) = oneshot::channel();
        self.queries.borrow_mut().insert(query.to_string(), rx);
        tx
    }
}

impl IndexGateway for ScriptedGateway {
    async fn submit_repository(&self, url: &str) -> RepoReply {
        self.repo_calls.borrow_mut().push(url.to_string());
        let reply = self.repos.borrow_mut().remove(url);
        match reply {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Network("reply dropped".to_string()))),
            None => Err(GatewayError::Network(format!("unexpected repository {}", url))),
        }
    }

    async fn run_query(&self, query: &str, model: SearchModelId) -> QueryReply {
        self.query_calls
            .borrow_mut()
            .push((query.to_string(), model));
        if query == "crash the index" {
            panic!("index backend crashed");
        }
        let reply = self.queries.borrow_mut().remove(query);
        match reply {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Network("reply dropped".to_string()))),
            None => Err(GatewayError::Network(format!("unexpected query {}", query))),
        }
    }
}

const FLASK: &str = "https://github.com/pallets/flask";

fn snapshot(name: &str) -> RepositorySnapshot {
    RepositorySnapshot {
        metadata: RepositoryMetadata {
            owner: "pallets".to_string(),
            name: name.to_string(),
            description: "The Python micro framework for building web applications.".to_string(),
            star_count: 68_000,
            fork_count: 16_000,
            avatar_url: "https://avatars.githubusercontent.com/u/16748505".to_string(),
            default_branch: Some("main".to_string()),
        },
        tree: vec![
            TreeNode::folder(
                "src",
                vec![TreeNode::folder(
                    "flask",
                    vec![TreeNode::file("app.py"), TreeNode::file("auth.py")],
                )],
            ),
            TreeNode::file("README.md"),
        ],
    }
}

fn result(id: &str, score: f64, code: &str) -> SearchResult {
    SearchResult {
        id: id.to_string(),
        filename: format!("src/flask/{}.py", id),
        score,
        code: code.to_string(),
        source_model: SearchModelId::DenseEmbedding,
    }
}

fn result_ids(client: &Client<ScriptedGateway>) -> Vec<String> {
    client
        .session()
        .search()
        .state()
        .results
        .iter()
        .map(|r| r.result.id.clone())
        .collect()
}

async fn loaded_client(gateway: &Rc<ScriptedGateway>) -> Client<ScriptedGateway> {
    let mut client = Client::new(Rc::clone(gateway), SearchModelId::DenseEmbedding);
    gateway.expect_repo(FLASK).send(Ok(snapshot("flask"))).unwrap();
    assert!(client.submit_repository(FLASK));
    assert_eq!(client.next_update().await, Some(Update::RepositoryLoaded));
    client
}

async fn settle_ready_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_blank_repository_url_never_reaches_gateway() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = Client::new(Rc::clone(&gateway), SearchModelId::DenseEmbedding);

            assert!(!client.submit_repository("   "));
            assert!(!client.submit_repository(""));

            assert_eq!(client.in_flight(), 0);
            assert_eq!(client.next_update().await, None);
            assert!(gateway.repo_calls.borrow().is_empty());
            assert!(matches!(client.session().state(), RepoState::Empty));
        })
        .await;
}

#[tokio::test]
async fn test_load_repository_and_browse() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = Client::new(Rc::clone(&gateway), SearchModelId::DenseEmbedding);

            let reply = gateway.expect_repo(FLASK);
            assert!(client.submit_repository(&format!("  {}  ", FLASK)));
            assert!(client.session().is_loading());

            reply.send(Ok(snapshot("flask"))).unwrap();
            assert_eq!(client.next_update().await, Some(Update::RepositoryLoaded));
            assert_eq!(gateway.repo_calls.borrow().as_slice(), &[FLASK.to_string()]);

            assert_eq!(client.toggle(&"1".parse().unwrap()), Some(true));
            assert_eq!(client.toggle(&"1.1".parse().unwrap()), Some(true));
            let names: Vec<String> = client
                .session()
                .tree()
                .unwrap()
                .visible_rows()
                .iter()
                .map(|row| row.name.to_string())
                .collect();
            assert_eq!(names, vec!["src", "flask", "app.py", "auth.py", "README.md"]);
        })
        .await;
}

#[tokio::test]
async fn test_repository_failure_returns_to_empty() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = Client::new(Rc::clone(&gateway), SearchModelId::DenseEmbedding);

            let missing = "https://github.com/nobody/missing";
            gateway
                .expect_repo(missing)
                .send(Err(GatewayError::Validation(
                    "Repository not found or private".to_string(),
                )))
                .unwrap();
            client.submit_repository(missing);

            assert_eq!(
                client.next_update().await,
                Some(Update::RepositoryFailed(GatewayError::Validation(
                    "Repository not found or private".to_string()
                )))
            );
            assert!(matches!(client.session().state(), RepoState::Empty));

            // Operator retries by hand
            gateway.expect_repo(FLASK).send(Ok(snapshot("flask"))).unwrap();
            client.submit_repository(FLASK);
            assert_eq!(client.next_update().await, Some(Update::RepositoryLoaded));
        })
        .await;
}

#[tokio::test]
async fn test_latest_repository_submission_wins() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = Client::new(Rc::clone(&gateway), SearchModelId::DenseEmbedding);

            let quart = "https://github.com/pallets/quart";
            let first = gateway.expect_repo(FLASK);
            let second = gateway.expect_repo(quart);
            client.submit_repository(FLASK);
            client.submit_repository(quart);
            assert_eq!(client.in_flight(), 2);

            second.send(Ok(snapshot("quart"))).unwrap();
            assert_eq!(client.next_update().await, Some(Update::RepositoryLoaded));

            first.send(Ok(snapshot("flask"))).unwrap();
            assert_eq!(client.next_update().await, Some(Update::Discarded));

            assert_eq!(client.session().metadata().unwrap().name, "quart");
            assert_eq!(client.in_flight(), 0);
        })
        .await;
}

#[tokio::test]
async fn test_stale_query_response_is_discarded() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            let reply_a = gateway.expect_query("query a");
            let reply_b = gateway.expect_query("query b");
            assert!(client.search("query a"));
            assert!(client.search("query b"));
            assert!(client.session().search().state().busy);

            // B answers first, A straggles in afterwards
            reply_b.send(Ok(vec![result("b1", 0.8, "")])).unwrap();
            assert_eq!(
                client.next_update().await,
                Some(Update::ResultsReady { count: 1 })
            );

            reply_a
                .send(Ok(vec![result("a1", 0.99, ""), result("a2", 0.5, "")]))
                .unwrap();
            assert_eq!(client.next_update().await, Some(Update::Discarded));

            let state = client.session().search().state();
            assert_eq!(state.query, "query b");
            assert!(!state.busy);
            assert_eq!(result_ids(&client), vec!["b1"]);
        })
        .await;
}

#[tokio::test]
async fn test_results_are_highlighted_against_query() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            gateway
                .expect_query("login errors")
                .send(Ok(vec![
                    result("auth", 0.91, "def login():\n    raise AuthError()\n    return True"),
                    result("app", 0.42, "app = Flask(__name__)\nlog_errors = True"),
                ]))
                .unwrap();
            client.search("login errors");
            client.next_update().await;

            let state = client.session().search().state();
            let highlighted: Vec<Vec<usize>> = state
                .results
                .iter()
                .map(|r| r.lines.iter().copied().collect())
                .collect();
            assert_eq!(highlighted, vec![vec![1], vec![2]]);
            assert_eq!(result_ids(&client), vec!["auth", "app"]);
        })
        .await;
}

#[tokio::test]
async fn test_selected_model_and_trimmed_query_reach_gateway() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            client.select_model(SearchModelId::Lexical);
            gateway.expect_query("url routing").send(Ok(Vec::new())).unwrap();
            assert!(client.search("  url routing \n"));
            client.next_update().await;

            gateway.expect_query("url routing").send(Ok(Vec::new())).unwrap();
            assert!(client.submit_query("url routing", SearchModelId::CrossEncoderRerank));
            assert_eq!(
                client.next_update().await,
                Some(Update::ResultsReady { count: 0 })
            );

            assert_eq!(
                gateway.query_calls.borrow().as_slice(),
                &[
                    ("url routing".to_string(), SearchModelId::Lexical),
                    ("url routing".to_string(), SearchModelId::CrossEncoderRerank),
                ]
            );
        })
        .await;
}

#[tokio::test]
async fn test_query_failure_clears_results() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            gateway
                .expect_query("blueprints")
                .send(Ok(vec![result("bp", 0.7, "")]))
                .unwrap();
            client.search("blueprints");
            client.next_update().await;
            assert_eq!(result_ids(&client), vec!["bp"]);

            gateway
                .expect_query("signals")
                .send(Err(GatewayError::Network("connection reset".to_string())))
                .unwrap();
            client.search("signals");
            assert_eq!(
                client.next_update().await,
                Some(Update::QueryFailed(GatewayError::Network(
                    "connection reset".to_string()
                )))
            );

            let state = client.session().search().state();
            assert!(!state.busy);
            assert!(state.results.is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_blank_query_changes_nothing() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            let before = client.session().search().snapshot();
            assert!(!client.search(""));
            assert!(!client.search("   "));

            assert_eq!(*client.session().search().state(), *before);
            assert!(gateway.query_calls.borrow().is_empty());
            assert_eq!(client.in_flight(), 0);
        })
        .await;
}

#[tokio::test]
async fn test_change_repo_discards_in_flight_query() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            let reply = gateway.expect_query("config loading");
            client.search("config loading");
            client.change_repo();

            assert!(matches!(client.session().state(), RepoState::Empty));
            assert!(client.session().search().state().is_idle());

            reply.send(Ok(vec![result("cfg", 0.9, "")])).unwrap();
            assert_eq!(client.next_update().await, Some(Update::Discarded));
            assert!(client.session().search().state().is_idle());
            assert!(client.session().tree().is_none());
        })
        .await;
}

#[tokio::test]
async fn test_pump_applies_arrived_settlements() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            assert!(client.pump().is_empty());

            gateway
                .expect_query("templates")
                .send(Ok(vec![result("tpl", 0.6, "")]))
                .unwrap();
            client.search("templates");
            settle_ready_tasks().await;

            assert_eq!(client.pump(), vec![Update::ResultsReady { count: 1 }]);
            assert!(!client.has_in_flight());
        })
        .await;
}

#[tokio::test]
async fn test_panicking_gateway_call_still_settles() {
    LocalSet::new()
        .run_until(async {
            let gateway = Rc::new(ScriptedGateway::default());
            let mut client = loaded_client(&gateway).await;

            assert!(client.search("crash the index"));
            let update = client.next_update().await;

            assert!(matches!(
                update,
                Some(Update::QueryFailed(GatewayError::Network(_)))
            ));
            assert!(!client.has_in_flight());
            let state = client.session().search().state();
            assert!(!state.busy);
            assert!(state.results.is_empty());
        })
        .await;
}
