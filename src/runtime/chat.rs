use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::debug;

use super::reporter::{console_events, render_status, Stream};
use crate::{
    agent::{Agent, RunOutcome},
    app::{mask, Config, CredentialStore, Workspace},
};

/// One line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Empty,
    Prompt(String),
    SetToken(String),
    SetKey(String),
    Status,
    Help,
    Quit,
    Unknown(String),
}

/// Parse a chat line. Anything not starting with `/` is a request for the agent.
pub fn parse_line(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Prompt(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "token" => ChatInput::SetToken(arg.to_string()),
        "key" => ChatInput::SetKey(arg.to_string()),
        "status" => ChatInput::Status,
        "help" | "?" => ChatInput::Help,
        "quit" | "exit" | "q" => ChatInput::Quit,
        other => ChatInput::Unknown(other.to_string()),
    }
}

const HELP: &str = "\
Type what you want changed on the website, e.g. \"Add an about page\".

Commands:
  /token <value>   Save the GitHub token
  /key <value>     Save the Gemini API key
  /status          Show repository, credentials and agent state
  /help            Show this help
  /quit            Leave (waits for a running pass)";

/// Interactive chat: each line becomes one agent pass, run in the background
pub struct ChatSession {
    agent: Arc<Agent>,
    config: Config,
    store: CredentialStore,
    /// Every spawned pass, including ones the agent will refuse as busy
    passes: JoinSet<()>,
}

impl ChatSession {
    pub fn new(config: Config, store: CredentialStore, verbose: bool) -> Self {
        let workspace = Workspace::connect(config.clone(), store.resolve());
        let agent = Agent::new(workspace, console_events(Stream::Stdout, verbose));
        Self::with_agent(Arc::new(agent), config, store)
    }

    fn with_agent(agent: Arc<Agent>, config: Config, store: CredentialStore) -> Self {
        Self {
            agent,
            config,
            store,
            passes: JoinSet::new(),
        }
    }

    /// Read lines from stdin until `/quit` or end of input
    pub async fn run(self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin())).await
    }

    async fn serve<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<()> {
        let workspace = self.agent.workspace();
        println!(
            "{} editing {}",
            "sitewright".bold(),
            workspace.config().repository.slug().cyan()
        );
        if let Err(e) = workspace.backends() {
            println!("{}", e.to_string().yellow());
        }
        println!("Type /help for commands.");

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line) {
                ChatInput::Empty => {}
                ChatInput::Prompt(prompt) => self.submit(prompt),
                ChatInput::SetToken(token) => self.set_token(&token),
                ChatInput::SetKey(key) => self.set_key(&key),
                ChatInput::Status => {
                    let workspace = self.agent.workspace();
                    println!("{}", render_status(&workspace, Some(self.agent.state())));
                }
                ChatInput::Help => println!("{}", HELP),
                ChatInput::Quit => break,
                ChatInput::Unknown(name) => {
                    println!("{} /{} (try /help)", "Unknown command:".yellow(), name);
                }
            }
        }

        // Piped input ends right after the last prompt; let running passes finish
        if self.agent.is_busy() {
            println!("{}", "Waiting for the running pass to finish...".dimmed());
        }
        while let Some(joined) = self.passes.join_next().await {
            if let Err(e) = joined {
                debug!("pass task ended abnormally: {}", e);
            }
        }
        Ok(())
    }

    fn submit(&mut self, prompt: String) {
        println!("{} {}", ">".bold(), prompt);
        let agent = self.agent.clone();
        self.passes.spawn(async move {
            if agent.handle_request(&prompt).await == RunOutcome::Busy {
                println!(
                    "{}",
                    "Agent is busy with the previous request, please wait.".yellow()
                );
            }
        });
        // forget passes that are already done
        while self.passes.try_join_next().is_some() {}
    }

    fn set_token(&mut self, token: &str) {
        if token.is_empty() {
            println!("Usage: /token <github token>");
            return;
        }
        match self.store.set_repo_token(token) {
            Ok(()) => {
                println!("{} GitHub token saved ({})", "[OK]".green(), mask(token));
                self.reconnect();
            }
            Err(e) => println!("{} {:#}", "Failed to save token:".red(), e),
        }
    }

    fn set_key(&mut self, key: &str) {
        if key.is_empty() {
            println!("Usage: /key <gemini api key>");
            return;
        }
        match self.store.set_ai_key(key) {
            Ok(()) => {
                println!("{} Gemini API key saved ({})", "[OK]".green(), mask(key));
                self.reconnect();
            }
            Err(e) => println!("{} {:#}", "Failed to save key:".red(), e),
        }
    }

    /// Rebuild clients from the edited credentials
    fn reconnect(&self) {
        let workspace = Workspace::connect(self.config.clone(), self.store.resolve());
        if let Some(error) = workspace.model_error() {
            println!("{} {}", "Gemini AI not initialized:".yellow(), error);
        }
        self.agent.reconfigure(workspace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_prompts() {
        assert_eq!(parse_line("   "), ChatInput::Empty);
        assert_eq!(
            parse_line("  Add an about page "),
            ChatInput::Prompt("Add an about page".into())
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("/token ghp_abc"), ChatInput::SetToken("ghp_abc".into()));
        assert_eq!(parse_line("/key   AIzaKey  "), ChatInput::SetKey("AIzaKey".into()));
        assert_eq!(parse_line("/token"), ChatInput::SetToken(String::new()));
        assert_eq!(parse_line("/status"), ChatInput::Status);
        assert_eq!(parse_line("/help"), ChatInput::Help);
        assert_eq!(parse_line("/quit"), ChatInput::Quit);
        assert_eq!(parse_line("/exit"), ChatInput::Quit);
        assert_eq!(parse_line("/deploy now"), ChatInput::Unknown("deploy".into()));
    }

    #[test]
    fn test_credential_edits_reconfigure_agent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        let mut config = Config::default();
        config.repository.owner = "octo".into();
        config.repository.name = "site".into();

        let mut session = ChatSession::new(config, CredentialStore::load(&path).unwrap(), false);
        session.set_token("ghp_abc");
        session.set_key("AIzaKey");

        let workspace = session.agent.workspace();
        assert_eq!(workspace.credentials().repo_token, "ghp_abc");
        assert_eq!(workspace.credentials().ai_key, "AIzaKey");
        assert!(workspace.backends().is_ok());

        let stored = CredentialStore::load(&path).unwrap();
        assert!(stored.stored().is_complete());
    }

    mod passes {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::app::Credentials;
        use crate::models::{GenerationRequest, Model};
        use crate::repo::{RepoReader, RepoWriter, Snapshot};
        use crate::utils::SiteError;
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        struct EmptySite;

        #[async_trait]
        impl RepoReader for EmptySite {
            async fn list_and_fetch_all(&self) -> Result<Snapshot, SiteError> {
                Ok(Snapshot::default())
            }
        }

        struct OnePage;

        #[async_trait]
        impl Model for OnePage {
            async fn generate(&self, _request: &GenerationRequest) -> Result<String, SiteError> {
                Ok(r#"{"files":[{"name":"index.html","content":"hi"},{"name":"about.html","content":"a"}]}"#.to_string())
            }

            fn name(&self) -> &str {
                "one-page"
            }
        }

        /// Slow writes, counting the ones that started and the ones that finished
        #[derive(Default)]
        struct SlowWriter {
            started: AtomicUsize,
            finished: AtomicUsize,
        }

        #[async_trait]
        impl RepoWriter for SlowWriter {
            async fn put(&self, _path: &str, _content: &str, _sha: Option<&str>) -> Result<(), SiteError> {
                self.started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                self.finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_end_of_input_waits_for_every_pass() {
            let dir = TempDir::new().unwrap();
            let mut config = Config::default();
            config.repository.owner = "octo".into();
            config.repository.name = "site".into();
            let writer = Arc::new(SlowWriter::default());
            let workspace = Workspace::from_parts(
                config.clone(),
                Credentials::new("ghp_abc", "AIzaKey"),
                Arc::new(EmptySite),
                writer.clone(),
                Arc::new(OnePage),
            );
            let agent = Arc::new(Agent::new(workspace, Arc::new(|_: &crate::agent::AgentEvent| {})));
            let session = ChatSession::with_agent(
                agent.clone(),
                config,
                CredentialStore::load(dir.path().join("credentials.toml")).unwrap(),
            );

            session
                .serve(&b"Add a home page\nAdd an about page\n"[..])
                .await
                .unwrap();

            // whichever pass won the gate ran to the end
            let started = writer.started.load(Ordering::SeqCst);
            assert!(started >= 2);
            assert_eq!(started % 2, 0);
            assert_eq!(writer.finished.load(Ordering::SeqCst), started);
            assert!(!agent.is_busy());
        }
    }
}
