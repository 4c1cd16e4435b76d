//! CLI entrypoint for xpcs-hypothesis
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod logging;

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use xpcs_application::{
    AskInput, AskUseCase, BehaviorConfig, BuildKnowledgeIndexUseCase, ConversationLogger,
    DraftHypothesisUseCase, DraftInput, EvaluateFeasibilityUseCase, EvaluateInput,
    HarvestCitationsUseCase, HarvestInput, HarvestProgress, LlmGateway, NoConversationLogger,
    NoHarvestProgress,
};
use xpcs_domain::{
    InstrumentProfile, KnowledgeIndex, OutputFormat, parse_citation_list, select_batch,
};
use xpcs_infrastructure::{
    ConfigLoader, FileConfig, FsPaperStore, JsonlConversationLogger, LocalKnowledgeLoader,
    RoutingGateway, SemanticScholarClient, load_hypothesis, load_instrument_profile,
    save_hypothesis,
};
use xpcs_presentation::cli::commands::{
    AskArgs, ChatArgs, DraftArgs, EvaluateArgs, HarvestArgs, InstrumentArgs, SearchArgs, joined,
};
use xpcs_presentation::{
    ChatRepl, Cli, Command, ConsoleFormatter, HarvestProgressReporter, SimpleHarvestProgress,
    SourceLine,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    let _log_guard =
        logging::setup_logging(cli.verbose, cli.quiet, config.logging.log_dir.as_deref())?;

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }
    let format = cli.output_format(config.output.format);

    // `config` reports issues instead of failing on them
    if matches!(cli.command, Command::Config) {
        show_config(&cli, &config, format);
        return Ok(());
    }
    check_config(&config)?;

    info!("Starting xpcs-hypothesis");

    let app = App {
        config: &config,
        format,
        quiet: cli.quiet,
    };

    match &cli.command {
        Command::Evaluate(args) => app.evaluate(args).await,
        Command::Draft(args) => app.draft(args).await,
        Command::Ask(args) => app.ask(args).await,
        Command::Chat(args) => app.chat(args).await,
        Command::Search(args) => app.search(args),
        Command::Harvest(args) => app.harvest(args).await,
        Command::Instrument(args) => app.instrument(args),
        Command::Config => Ok(()),
    }
}

fn show_config(cli: &Cli, config: &FileConfig, format: OutputFormat) {
    let sources = if cli.no_config {
        Vec::new()
    } else {
        ConfigLoader::sources(cli.config.as_deref())
    };
    let lines: Vec<SourceLine<'_>> = sources
        .iter()
        .map(|s| SourceLine {
            label: s.label,
            location: &s.location,
            found: s.found,
        })
        .collect();
    let issues = config.validate();

    let output = match format {
        OutputFormat::Text => ConsoleFormatter::format_config(&lines, &issues),
        OutputFormat::Json => ConsoleFormatter::format_config_json(&lines, &issues),
    };
    println!("{}", output);
}

/// Warnings are logged; any error aborts startup.
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    let mut errors = 0;
    for issue in &issues {
        if issue.is_error() {
            errors += 1;
            eprintln!("{}", ConsoleFormatter::format_issue(issue));
        } else {
            warn!("{}", issue.message);
        }
    }
    if errors > 0 {
        bail!("Invalid configuration ({errors} error(s)); run `xpcs-hypothesis config` for details");
    }
    Ok(())
}

/// Loaded configuration plus the global output flags
struct App<'a> {
    config: &'a FileConfig,
    format: OutputFormat,
    quiet: bool,
}

impl App<'_> {
    // === Dependency Injection ===

    fn gateway(&self) -> Arc<dyn LlmGateway> {
        Arc::new(RoutingGateway::from_config(&self.config.providers))
    }

    /// A gateway with no providers, for rule-only paths that never call an LLM.
    fn offline_gateway(&self) -> Arc<dyn LlmGateway> {
        Arc::new(RoutingGateway::new(Vec::new(), &self.config.providers))
    }

    fn behavior(&self) -> BehaviorConfig {
        BehaviorConfig::from_timeout_seconds(self.config.providers.timeout_seconds)
    }

    fn conversation_logger(&self) -> Result<Arc<dyn ConversationLogger>> {
        match &self.config.logging.conversation_log {
            Some(path) => {
                let logger = JsonlConversationLogger::open(path).with_context(|| {
                    format!("Failed to open conversation log {}", path.display())
                })?;
                Ok(Arc::new(logger))
            }
            None => Ok(Arc::new(NoConversationLogger)),
        }
    }

    fn knowledge_index(&self) -> Result<Arc<KnowledgeIndex>> {
        let loader = LocalKnowledgeLoader::from_config(&self.config.knowledge);
        let index = BuildKnowledgeIndexUseCase::new(Arc::new(loader))
            .execute(&self.config.knowledge.chunking())
            .context("Failed to load the knowledge base")?;
        Ok(Arc::new(index))
    }

    fn instrument_profile(&self, explicit: Option<&Path>) -> Result<InstrumentProfile> {
        let path = explicit.or(self.config.instrument.profile.as_deref());
        load_instrument_profile(path).context("Failed to load the instrument profile")
    }

    fn print(&self, text: String, json: String) {
        match self.format {
            OutputFormat::Text => println!("{}", text),
            OutputFormat::Json => println!("{}", json),
        }
    }

    // === Commands ===

    async fn evaluate(&self, args: &EvaluateArgs) -> Result<()> {
        let hypothesis = load_hypothesis(&args.file)
            .with_context(|| format!("Failed to read hypothesis {}", args.file.display()))?;
        let instrument = self.instrument_profile(args.instrument.as_deref())?;

        let (gateway, index) = if args.narrative {
            (self.gateway(), self.knowledge_index()?)
        } else {
            (self.offline_gateway(), Arc::new(KnowledgeIndex::default()))
        };

        let mut input = EvaluateInput::new(hypothesis, instrument)
            .with_thresholds(self.config.feasibility.clone());
        if args.narrative {
            let model = args
                .model
                .clone()
                .unwrap_or_else(|| self.config.models.narrative_model());
            input = input.with_narrative(model, self.config.knowledge.top_k);
        }

        let output = EvaluateFeasibilityUseCase::new(gateway, index)
            .with_behavior(self.behavior())
            .with_conversation_logger(self.conversation_logger()?)
            .execute(input)
            .await?;

        self.print(
            ConsoleFormatter::format_evaluation(&output),
            ConsoleFormatter::format_evaluation_json(&output),
        );
        Ok(())
    }

    async fn draft(&self, args: &DraftArgs) -> Result<()> {
        let instrument = self.instrument_profile(args.instrument.as_deref())?;
        let model = args
            .model
            .clone()
            .unwrap_or_else(|| self.config.models.draft_model());
        let top_k = args.top_k.unwrap_or(self.config.knowledge.top_k);

        let input = DraftInput::new(joined(&args.idea), model, instrument)
            .with_top_k(top_k)
            .with_thresholds(self.config.feasibility.clone());

        let output = DraftHypothesisUseCase::new(self.gateway(), self.knowledge_index()?)
            .with_behavior(self.behavior())
            .with_conversation_logger(self.conversation_logger()?)
            .execute(input)
            .await?;

        if let Some(path) = &args.save {
            save_hypothesis(&output.hypothesis, path)
                .with_context(|| format!("Failed to save hypothesis to {}", path.display()))?;
            info!("Saved hypothesis to {}", path.display());
        }

        self.print(
            ConsoleFormatter::format_draft(&output),
            ConsoleFormatter::format_draft_json(&output),
        );
        if let Some(path) = &args.save
            && self.format == OutputFormat::Text
        {
            println!("Saved to {}", path.display());
        }
        Ok(())
    }

    async fn ask(&self, args: &AskArgs) -> Result<()> {
        let instrument = self.instrument_profile(None)?;
        let model = args
            .model
            .clone()
            .unwrap_or_else(|| self.config.models.chat_model());
        let top_k = args.top_k.unwrap_or(self.config.knowledge.top_k);

        let output = AskUseCase::new(self.gateway(), self.knowledge_index()?, Arc::new(instrument))
            .with_behavior(self.behavior())
            .with_conversation_logger(self.conversation_logger()?)
            .execute(AskInput::new(joined(&args.question), model).with_top_k(top_k))
            .await?;

        self.print(
            ConsoleFormatter::format_answer(&output),
            ConsoleFormatter::format_answer_json(&output),
        );
        Ok(())
    }

    async fn chat(&self, args: &ChatArgs) -> Result<()> {
        let instrument = self.instrument_profile(None)?;
        let model = args
            .model
            .clone()
            .unwrap_or_else(|| self.config.models.chat_model());
        let repl_config = &self.config.repl;

        let mut repl = ChatRepl::new(
            self.gateway(),
            self.knowledge_index()?,
            Arc::new(instrument),
            model,
        )
        .with_behavior(self.behavior())
        .with_conversation_logger(self.conversation_logger()?)
        .with_thresholds(self.config.feasibility.clone())
        .with_top_k(self.config.knowledge.top_k)
        .with_max_turns(repl_config.max_turns)
        .with_history_file(repl_config.history_file.as_ref().map(PathBuf::from))
        .with_progress(repl_config.show_progress && !self.quiet)
        .with_hypothesis_loader(Box::new(|path: &Path| {
            load_hypothesis(path).map_err(|e| e.to_string())
        }));

        repl.run().await?;
        Ok(())
    }

    fn search(&self, args: &SearchArgs) -> Result<()> {
        let query = joined(&args.query);
        let top_k = args.top_k.unwrap_or(self.config.knowledge.top_k);
        let hits = self.knowledge_index()?.search(&query, top_k)?;

        self.print(
            ConsoleFormatter::format_search(&query, &hits),
            ConsoleFormatter::format_search_json(&query, &hits),
        );
        Ok(())
    }

    async fn harvest(&self, args: &HarvestArgs) -> Result<()> {
        let text = std::fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read citation list {}", args.file.display()))?;
        let citations = parse_citation_list(&text);
        if citations.is_empty() {
            bail!("No citations found in {}", args.file.display());
        }

        let (start_index, batch) = match args.range {
            Some(range) => {
                let selected = select_batch(&citations, range);
                let Some(&(first, _)) = selected.first() else {
                    bail!(
                        "Range {}-{} is past the end of the list ({} citations)",
                        range.start,
                        range.end,
                        citations.len()
                    );
                };
                (first, selected.into_iter().map(|(_, c)| c).collect())
            }
            None => (1, citations),
        };

        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| self.config.harvest.output_dir.clone());
        let store = FsPaperStore::create(&output_dir)
            .with_context(|| format!("Failed to prepare {}", output_dir.display()))?;
        let scholar = SemanticScholarClient::from_config(&self.config.harvest);

        // Ctrl-C stops after the current citation; the batch log is still written
        let token = CancellationToken::new();
        tokio::spawn({
            let token = token.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted; finishing the current citation");
                    token.cancel();
                }
            }
        });

        let progress: Box<dyn HarvestProgress> = match (self.format, self.quiet) {
            (OutputFormat::Json, _) => Box::new(NoHarvestProgress),
            (OutputFormat::Text, true) => Box::new(SimpleHarvestProgress),
            (OutputFormat::Text, false) => Box::new(HarvestProgressReporter::new()),
        };

        let summary = HarvestCitationsUseCase::new(Arc::new(scholar), Arc::new(store))
            .with_policy(self.config.harvest.policy())
            .with_conversation_logger(self.conversation_logger()?)
            .with_cancellation(token)
            .execute(
                HarvestInput {
                    citations: batch,
                    start_index,
                },
                progress.as_ref(),
            )
            .await?;

        self.print(
            ConsoleFormatter::format_harvest(&summary),
            ConsoleFormatter::format_harvest_json(&summary),
        );
        Ok(())
    }

    fn instrument(&self, args: &InstrumentArgs) -> Result<()> {
        let profile = self.instrument_profile(args.instrument.as_deref())?;
        self.print(
            ConsoleFormatter::format_instrument(&profile),
            ConsoleFormatter::format_instrument_json(&profile),
        );
        Ok(())
    }
}
