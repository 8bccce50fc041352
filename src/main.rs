use std::io::{BufRead, Write};

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use parlor::catalog::{self, Catalog};
use parlor::config::{self, ChatConfig};
use parlor::db::repos::{compressed, detailed};
use parlor::db::DbPool;
use parlor::engine::state::{AutoRun, ConversationState};
use parlor::engine::{summarizer, turn};
use parlor::error::AppError;
use parlor::llm::openai::OpenAiClient;
use parlor::llm::LanguageModel;
use parlor::logging;

#[derive(Parser)]
#[command(name = "parlor", version, about = "Persona chatroom simulator with tiered agent memory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chatroom session.
    Chat {
        /// Preset persona group to seat (see `parlor groups`).
        #[arg(long, default_value = "free-for-all")]
        room: String,
        /// Your display name in the room.
        #[arg(long)]
        user: Option<String>,
    },
    /// List the persona catalog.
    Roster,
    /// List the preset persona groups.
    Groups,
    /// Show an agent's durable memories.
    Memory {
        /// Agent name.
        agent: String,
        /// Show the full detailed history instead of the recent window.
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!(error = %e, kind = e.kind(), "Fatal error");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let data_dir = config::data_dir();
    let config = ChatConfig::load(&data_dir)?;

    match cli.command {
        Command::Roster => {
            for persona in Catalog::builtin().personas() {
                println!("{:<8} {}", persona.name, persona.description);
                println!("{:<8} {}", "", persona.avatar_url());
            }
            Ok(())
        }
        Command::Groups => {
            for group in Catalog::builtin().groups() {
                println!("{:<14} {}  [{}]", group.name, group.description, group.personas.join(", "));
            }
            Ok(())
        }
        Command::Memory { agent, all } => {
            let pool = parlor::db::init_db(&data_dir)?;
            show_memory(&pool, &config, &agent, all)
        }
        Command::Chat { room, user } => {
            let pool = parlor::db::init_db(&data_dir)?;
            let llm = OpenAiClient::new(&config)?;
            chat(&llm, &pool, &config, &room, user).await
        }
    }
}

fn show_memory(pool: &DbPool, config: &ChatConfig, agent: &str, all: bool) -> Result<(), AppError> {
    let compressed_memory = compressed::read(pool, agent)?;
    println!("== Compressed memory ==");
    if compressed_memory.is_empty() {
        println!("(none recorded yet)");
    } else {
        println!("{compressed_memory}");
    }

    println!("\n== Detailed memory ==");
    let entries = if all {
        detailed::read_all(pool, agent)?
    } else {
        detailed::read_recent(pool, agent, config.working_memory_capacity as i64)?
    };
    if entries.is_empty() {
        println!("(no entries)");
    } else {
        print!("{}", detailed::render(&entries));
    }
    Ok(())
}

async fn chat(
    llm: &dyn LanguageModel,
    pool: &DbPool,
    config: &ChatConfig,
    room: &str,
    user: Option<String>,
) -> Result<(), AppError> {
    let catalog = Catalog::builtin();
    let roster = catalog
        .group(room)
        .map(|g| g.personas.clone())
        .ok_or_else(|| AppError::NotFound(format!("Group {room}")))?;

    let user_name = user.unwrap_or_else(|| format!("User_{}", rand::random::<u16>() % 9000 + 1000));
    let mut state = ConversationState::new(user_name, roster);
    let mut catalog = catalog;
    let mut rng = StdRng::from_entropy();

    println!("Room '{room}' with: {}", state.roster.join(", "));
    println!("Commands: /turn, /auto N, /summaries, /memory NAME, /persona TEXT, /quit");

    // An agent opens the room before the user types anything.
    if let turn::TurnOutcome::Spoke { .. } =
        turn::opening_turn(llm, pool, config, &catalog, &mut state, &mut rng).await?
    {
        print_last(&state);
    }

    let stdin = std::io::stdin();
    loop {
        print!("{}> ", state.user_name);
        std::io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').map_or((line, ""), |(a, b)| (a, b.trim())) {
            ("/quit", _) => break,
            ("/turn", _) => {
                run_one_turn(llm, pool, config, &catalog, &mut state, &mut rng).await?;
            }
            ("/auto", arg) => {
                let requested: u64 = arg.parse().map_err(|_| {
                    AppError::Validation(format!("'/auto {arg}': expected a turn count"))
                })?;
                let mut auto = AutoRun::new(requested);
                turn::run_auto(
                    llm,
                    pool,
                    config,
                    &catalog,
                    &mut state,
                    &mut rng,
                    &mut auto,
                    |s, summarized| {
                        print_last(s);
                        if summarized {
                            println!("(conversation summary recorded; /summaries to view)");
                        }
                    },
                )
                .await?;
                if !auto.is_done() {
                    println!("(no agents in the room)");
                }
            }
            ("/summaries", _) => {
                if state.summaries.is_empty() {
                    println!("(no summaries yet)");
                }
                for (i, record) in state.summaries.iter().enumerate() {
                    println!("-- summary {} (turn {}) --\n{}", i + 1, record.turn, record.text);
                }
            }
            ("/memory", agent) if !agent.is_empty() => {
                if let Some(wm) = state.working(agent) {
                    println!("== Working memory ==\n{}", wm.render());
                }
                if let Err(e) = show_memory(pool, config, agent, false) {
                    warn_user(&e);
                }
            }
            ("/persona", notes) if !notes.is_empty() => {
                match catalog::draft_persona(llm, notes).await {
                    Ok(persona) => {
                        let name = persona.name.clone();
                        match catalog.register(persona) {
                            Ok(()) => {
                                state.roster.push(name.clone());
                                println!("{name} joined the room.");
                            }
                            Err(e) => warn_user(&e),
                        }
                    }
                    Err(e) => warn_user(&e),
                }
            }
            _ if line.starts_with('/') => {
                println!("unknown command: {line}");
            }
            _ => {
                let user = state.user_name.clone();
                state.push_message(user, line);
                run_one_turn(llm, pool, config, &catalog, &mut state, &mut rng).await?;
            }
        }
    }

    Ok(())
}

async fn run_one_turn(
    llm: &dyn LanguageModel,
    pool: &DbPool,
    config: &ChatConfig,
    catalog: &Catalog,
    state: &mut ConversationState,
    rng: &mut StdRng,
) -> Result<(), AppError> {
    match turn::run_turn(llm, pool, config, catalog, state, rng).await? {
        turn::TurnOutcome::NoAgents => println!("(no agents in the room)"),
        turn::TurnOutcome::Spoke { .. } => print_last(state),
    }
    if summarizer::maybe_summarize(llm, state, config.summary_interval).await {
        println!("(conversation summary recorded; /summaries to view)");
    }
    Ok(())
}

fn print_last(state: &ConversationState) {
    if let Some(msg) = state.messages.last() {
        println!(
            "[{}] {}: {}",
            msg.timestamp.format("%H:%M:%S"),
            msg.speaker,
            msg.content
        );
    }
}

fn warn_user(e: &AppError) {
    tracing::warn!(error = %e, kind = e.kind(), "Command failed");
    println!("warning: {e}");
}
