//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use xpcs_application::{
    AskInput, AskUseCase, BehaviorConfig, ConversationLogger, DraftHypothesisUseCase, DraftInput,
    EvaluateFeasibilityUseCase, EvaluateInput, LlmGateway,
};
use xpcs_domain::{
    Conversation, FeasibilityThresholds, Hypothesis, InstrumentProfile, KnowledgeIndex, Model,
    ScoredChunk,
};

/// Reads a hypothesis file for `/evaluate`.
pub type HypothesisLoader = Box<dyn Fn(&Path) -> Result<Hypothesis, String> + Send + Sync>;

/// A parsed line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Draft(String),
    Evaluate(PathBuf),
    Search(String),
    Instrument,
    Sources,
    Clear,
    Help,
    Quit,
    /// A command that needs an argument was given none
    MissingArgument(&'static str),
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return ReplCommand::Ask(line.to_string());
        }

        let (command, args) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/clear" => ReplCommand::Clear,
            "/sources" => ReplCommand::Sources,
            "/instrument" => ReplCommand::Instrument,
            "/draft" if args.is_empty() => ReplCommand::MissingArgument("/draft <idea>"),
            "/draft" => ReplCommand::Draft(args.to_string()),
            "/evaluate" if args.is_empty() => ReplCommand::MissingArgument("/evaluate <file>"),
            "/evaluate" => ReplCommand::Evaluate(PathBuf::from(args)),
            "/search" if args.is_empty() => ReplCommand::MissingArgument("/search <query>"),
            "/search" => ReplCommand::Search(args.to_string()),
            _ => ReplCommand::Unknown(command.to_string()),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    ask: AskUseCase,
    draft: DraftHypothesisUseCase,
    evaluate: EvaluateFeasibilityUseCase,
    index: Arc<KnowledgeIndex>,
    instrument: Arc<InstrumentProfile>,
    thresholds: FeasibilityThresholds,
    model: Model,
    top_k: usize,
    conversation: Conversation,
    last_sources: Vec<ScoredChunk>,
    hypothesis_loader: Option<HypothesisLoader>,
    history_path: Option<PathBuf>,
    show_progress: bool,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        index: Arc<KnowledgeIndex>,
        instrument: Arc<InstrumentProfile>,
        model: Model,
    ) -> Self {
        Self {
            ask: AskUseCase::new(gateway.clone(), index.clone(), instrument.clone()),
            draft: DraftHypothesisUseCase::new(gateway.clone(), index.clone()),
            evaluate: EvaluateFeasibilityUseCase::new(gateway, index.clone()),
            index,
            instrument,
            thresholds: FeasibilityThresholds::default(),
            model,
            top_k: 5,
            conversation: Conversation::new(8),
            last_sources: Vec::new(),
            hypothesis_loader: None,
            history_path: dirs::data_dir()
                .map(|p| p.join("xpcs-hypothesis").join("chat_history.txt")),
            show_progress: true,
        }
    }

    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.ask = self.ask.with_behavior(behavior.clone());
        self.draft = self.draft.with_behavior(behavior.clone());
        self.evaluate = self.evaluate.with_behavior(behavior);
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.ask = self.ask.with_conversation_logger(logger.clone());
        self.draft = self.draft.with_conversation_logger(logger.clone());
        self.evaluate = self.evaluate.with_conversation_logger(logger);
        self
    }

    pub fn with_thresholds(mut self, thresholds: FeasibilityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Exchanges kept as context for follow-up questions
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.conversation = Conversation::new(max_turns);
        self
    }

    pub fn with_hypothesis_loader(mut self, loader: HypothesisLoader) -> Self {
        self.hypothesis_loader = Some(loader);
        self
    }

    /// Override the history file; `None` keeps the default in the data dir
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_path = path;
        }
        self
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline("xpcs> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line.trim());

                    if !self.handle(ReplCommand::parse(&line)).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        let stats = self.index.stats();
        println!();
        println!("{}", "XPCS hypothesis assistant".bold().cyan());
        println!(
            "{} {}   {} {}",
            "Model:".bold(),
            self.model,
            "Instrument:".bold(),
            self.instrument.name
        );
        println!(
            "{} {} documents, {} chunks",
            "Knowledge:".bold(),
            stats.documents,
            stats.chunks
        );
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  {}  - Draft a hypothesis from an idea", "/draft <idea>".cyan());
        println!("  {} - Check a hypothesis TOML file", "/evaluate <file>".cyan());
        println!("  {} - Search the knowledge base", "/search <query>".cyan());
        println!("  {}    - Show the instrument profile", "/instrument".cyan());
        println!("  {}       - Sources behind the last answer", "/sources".cyan());
        println!("  {}         - Forget the conversation", "/clear".cyan());
        println!("  {}          - Show this help", "/help".cyan());
        println!("  {}          - Exit chat", "/quit".cyan());
        println!();
        println!("{}", "Anything else is asked as a question.".dimmed());
        println!();
    }

    /// Returns false when the REPL should exit.
    async fn handle(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return false;
            }
            ReplCommand::Help => Self::print_help(),
            ReplCommand::Clear => {
                self.conversation.clear();
                self.last_sources.clear();
                println!("{}", "Conversation cleared.".green());
            }
            ReplCommand::Sources => {
                if self.last_sources.is_empty() {
                    println!("{}", "No sources yet.".dimmed());
                } else {
                    print!("{}", ConsoleFormatter::format_sources(&self.last_sources));
                }
            }
            ReplCommand::Instrument => {
                println!("{}", ConsoleFormatter::format_instrument(&self.instrument));
            }
            ReplCommand::Search(query) => match self.index.search(&query, self.top_k) {
                Ok(hits) => {
                    println!("{}", ConsoleFormatter::format_search(&query, &hits));
                    self.last_sources = hits;
                }
                Err(e) => eprintln!("{} {}", "Error:".red(), e),
            },
            ReplCommand::Ask(question) => self.ask_question(question).await,
            ReplCommand::Draft(idea) => self.draft_hypothesis(idea).await,
            ReplCommand::Evaluate(path) => self.evaluate_file(&path).await,
            ReplCommand::MissingArgument(usage) => println!("Usage: {}", usage),
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        true
    }

    async fn ask_question(&mut self, question: String) {
        let input = AskInput::new(question.clone(), self.model.clone())
            .with_top_k(self.top_k)
            .with_conversation(self.conversation.clone());

        let spinner = self.spinner("Thinking...");
        let result = self.ask.execute(input).await;
        finish(spinner);

        match result {
            Ok(output) => {
                println!();
                println!("{}", output.answer.trim());
                println!();
                self.conversation.push_exchange(question, output.answer.clone());
                self.last_sources = output.sources;
            }
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }

    async fn draft_hypothesis(&mut self, idea: String) {
        let input = DraftInput::new(idea, self.model.clone(), (*self.instrument).clone())
            .with_top_k(self.top_k)
            .with_thresholds(self.thresholds.clone());

        let spinner = self.spinner("Drafting...");
        let result = self.draft.execute(input).await;
        finish(spinner);

        match result {
            Ok(output) => {
                println!("{}", ConsoleFormatter::format_draft(&output));
                self.last_sources = output.sources;
            }
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }

    async fn evaluate_file(&mut self, path: &Path) {
        let Some(loader) = &self.hypothesis_loader else {
            eprintln!("{}", "Evaluating files is not available in this session.".yellow());
            return;
        };
        let hypothesis = match loader(path) {
            Ok(h) => h,
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e);
                return;
            }
        };

        let input = EvaluateInput::new(hypothesis, (*self.instrument).clone())
            .with_thresholds(self.thresholds.clone());
        match self.evaluate.execute(input).await {
            Ok(output) => println!("{}", ConsoleFormatter::format_evaluation(&output)),
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }

    fn spinner(&self, message: &'static str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    }
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}
