//! Terminal front-end for the PaveOS creator CRM.
//!
//! Signs in once, keeps the session in a local SQLite file and drives the
//! lead, pipeline, analytics and conversation views from the shell.

mod config;
mod render;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use crm_views::{
    AnalyticsView, DropOutcome, LeadConversation, LeadFilter, LeadInbox, Notifier,
    PipelineBoard, SessionController,
};
use paveos_api::{LeadService, LeadSource, LeadStatus, PaveClient, TimeRange, User, WhopHandoff};
use paveos_realtime::{ConnectionManager, ServerEvent, SocketConfig};
use session_store::SessionStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "paveos")]
#[command(about = "Work your PaveOS leads from the terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in to the demo account
    Demo,

    /// Sign in with a Whop identity
    Whop {
        /// Whop user id
        user_id: String,
        /// Whop company id
        company_id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List leads
    Leads {
        /// Match name, email or Discord username
        #[arg(long)]
        search: Option<String>,
        /// Only this stage (e.g. "new", "in conversation")
        #[arg(long, value_parser = parse_stage)]
        status: Option<LeadStatus>,
        /// Only this source (e.g. "discord")
        #[arg(long, value_parser = parse_source)]
        source: Option<LeadSource>,
    },

    /// Show the pipeline board
    Pipeline,

    /// Move a lead to another stage
    Move {
        lead: String,
        #[arg(value_parser = parse_stage)]
        stage: LeadStatus,
    },

    /// Show analytics for a time range
    Analytics {
        /// Days covered: 7, 30, 90 or 365
        #[arg(long, default_value = "30")]
        range: TimeRange,
    },

    /// Follow a lead's conversation until Ctrl-C
    Watch { lead: String },

    /// Send a message to a lead
    Send { lead: String, text: String },
}

fn parse_stage(input: &str) -> Result<LeadStatus, String> {
    LeadStatus::parse_stage(input).ok_or_else(|| {
        let stages: Vec<&str> = LeadStatus::STAGES.iter().map(|s| s.as_str()).collect();
        format!("unknown stage {input:?} (use one of {})", stages.join(", "))
    })
}

fn parse_source(input: &str) -> Result<LeadSource, String> {
    let source = LeadSource::from(input.trim().to_lowercase());
    match source {
        LeadSource::Other(raw) if raw.is_empty() => Err("source must not be empty".to_string()),
        source => Ok(source),
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    debug!(api = %config.api.base_url, db = %config.session_db, "Loaded configuration");

    let client = PaveClient::new(config.api.clone())?;
    let store = SessionStore::connect(&config.session_db).await?;
    store.migrate().await?;
    let sockets = ConnectionManager::new(SocketConfig::new(config.api.socket_url()));
    let session = SessionController::new(client, store.clone(), sockets.clone());

    let (notifier, mut notifications) = Notifier::channel();
    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            println!("{}", render::notification(&notification));
        }
    });

    let result = run(args.command, &session, notifier).await;

    sockets.destroy();
    store.close().await;
    let _ = printer.await;
    result
}

async fn run(command: Command, session: &SessionController, notifier: Notifier) -> CliResult<()> {
    match command {
        Command::Login { email, password } => {
            signed_in(&session.login(&email, &password).await?);
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            signed_in(&session.register(&name, &email, &password).await?);
        }
        Command::Demo => signed_in(&session.login_demo().await?),
        Command::Whop {
            user_id,
            company_id,
            email,
            username,
        } => {
            let handoff = WhopHandoff::new(user_id, company_id, email, username);
            signed_in(&session.login_with_whop(&handoff).await?);
        }
        Command::Logout => {
            session.restore().await?;
            session.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match session.restore().await? {
            Some(user) => println!("{}", render::user(&user)),
            None => println!("Not signed in"),
        },
        Command::Leads {
            search,
            status,
            source,
        } => {
            let service = require_user(session).await?;
            let mut inbox = LeadInbox::new(service, notifier);
            inbox.load().await?;

            let filter = LeadFilter {
                search,
                status,
                source,
            };
            let leads = inbox.filtered(&filter);
            for lead in &leads {
                println!("{}", render::lead_row(lead));
            }
            if let Some(stats) = inbox.stats() {
                println!("\n{}", render::stats(stats));
            }
            if !filter.is_empty() {
                println!("{} of {} leads match", leads.len(), inbox.leads().len());
            }
        }
        Command::Pipeline => {
            let service = require_user(session).await?;
            let mut board = PipelineBoard::new(service, notifier);
            board.load().await?;
            print!("{}", render::board(&board.columns()));
            println!("\n{}", render::metrics(&board.metrics()));
        }
        Command::Move { lead, stage } => {
            let service = require_user(session).await?;
            let mut board = PipelineBoard::new(service, notifier);
            board.load().await?;
            if board.drop_lead(&lead, stage).await? == DropOutcome::Unchanged {
                println!("Lead {lead} is already in that stage");
            }
        }
        Command::Analytics { range } => {
            let service = require_user(session).await?;
            let mut view = AnalyticsView::new(service, notifier);
            view.select(range).await?;
            println!("{range}\n");
            println!("{}\n", render::headline(&view.headline()));
            println!("Pipeline\n{}\n", render::stage_series(&view.pipeline_series()));
            println!("Sources\n{}", render::source_series(&view.source_series()));
        }
        Command::Watch { lead } => {
            let service = require_user(session).await?;
            watch(session, service, &lead, notifier).await?;
        }
        Command::Send { lead, text } => {
            let service = require_user(session).await?;
            let mut conversation =
                LeadConversation::open(service, session.sockets().clone(), &lead, notifier)
                    .await?;
            conversation.set_draft(text);
            let sent = conversation.send_message().await;
            conversation.close();
            sent?;
        }
    }
    Ok(())
}

fn signed_in(user: &User) {
    println!("Signed in as {}", render::user(user));
}

/// Restore the stored session or fail with a hint to sign in.
async fn require_user(session: &SessionController) -> CliResult<Arc<dyn LeadService>> {
    match session.restore().await? {
        Some(user) => {
            debug!(user_id = %user.id, "Using stored session");
            Ok(Arc::new(session.client().clone()))
        }
        None => Err("Not signed in. Run `paveos login` or `paveos demo` first.".into()),
    }
}

async fn watch(
    session: &SessionController,
    service: Arc<dyn LeadService>,
    lead_id: &str,
    notifier: Notifier,
) -> CliResult<()> {
    let mut conversation =
        LeadConversation::open(service, session.sockets().clone(), lead_id, notifier).await?;

    let lead = conversation.lead();
    println!("{} [{}]", lead.name, lead.status.display_name());
    for message in conversation.messages() {
        println!("{}", render::message_line(message));
    }

    let mut state = session.sockets().watch_state();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                info!(state = ?current, "Realtime connection state changed");
            }
            event = conversation.next_event() => {
                match event {
                    Some(ServerEvent::NewMessage(message)) => {
                        println!("{}", render::message_line(&message));
                    }
                    Some(ServerEvent::LeadUpdated(_)) => {
                        let lead = conversation.lead();
                        println!("-- {} is now {}", lead.name, lead.status.display_name());
                    }
                    _ => {}
                }
            }
        }
    }

    conversation.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_move() {
        let args = Args::try_parse_from(["paveos", "move", "L1", "in conversation"]).unwrap();
        match args.command {
            Command::Move { lead, stage } => {
                assert_eq!(lead, "L1");
                assert_eq!(stage, LeadStatus::InConversation);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_args_reject_unknown_stage() {
        assert!(Args::try_parse_from(["paveos", "move", "L1", "maybe"]).is_err());
    }

    #[test]
    fn test_analytics_range_defaults_to_month() {
        let args = Args::try_parse_from(["paveos", "analytics"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Analytics {
                range: TimeRange::Month
            }
        ));

        let args = Args::try_parse_from(["paveos", "analytics", "--range", "90d"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Analytics {
                range: TimeRange::Quarter
            }
        ));
    }

    #[test]
    fn test_leads_filters_parse() {
        let args = Args::try_parse_from([
            "paveos", "leads", "--status", "won", "--source", "Instagram",
        ])
        .unwrap();
        match args.command {
            Command::Leads { status, source, .. } => {
                assert_eq!(status, Some(LeadStatus::Won));
                assert_eq!(source, Some(LeadSource::Instagram));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
