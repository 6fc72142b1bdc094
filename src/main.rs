use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use runwatch::artifact::ArtifactClassifier;
use runwatch::config::TrackerConfig;
use runwatch::display::{render_roots, render_subtree};
use runwatch::tree::{ExecutionNode, TreeNode};
use runwatch::Tracker;

#[derive(Parser)]
#[command(
    name = "runwatch",
    about = "Track test-automation executions from a remote backend",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a runwatch.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll once and list known executions, newest first
    List {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Poll once and show one execution's test results and artifacts
    Show {
        /// Execution id as reported by the backend
        execution_id: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Keep polling and re-render the execution list whenever it changes
    Watch {
        /// Exit after the first render
        #[arg(long)]
        once: bool,
    },

    /// Print the artifact kind of each path
    Classify {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

fn init_tracing(config: &TrackerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TrackerConfig::resolve(cli.config.as_deref())?;
    init_tracing(&config);

    match cli.command {
        Commands::List { json } => {
            let tracker = Tracker::from_config(&config)?;
            tracker.poll_once().await;
            let roots = tracker.projector().roots();
            if json {
                println!("{}", serde_json::to_string_pretty(&roots)?);
            } else {
                print!("{}", render_roots(tracker.projector()));
            }
        }
        Commands::Show { execution_id, json } => {
            let tracker = Tracker::from_config(&config)?;
            tracker.poll_once().await;
            let projector = tracker.projector();

            match tracker.cache().brief(&execution_id) {
                Some(brief) => {
                    let root = TreeNode::Root(ExecutionNode { brief, hydrated: false });
                    if json {
                        let children = projector.children(&root).await;
                        println!("{}", serde_json::to_string_pretty(&children)?);
                    } else {
                        print!("{}", render_subtree(projector, &root, 0, 3).await);
                    }
                }
                None => {
                    // Not in the listing window; the detail endpoint may still know it.
                    let children = projector.execution_children(&execution_id).await;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&children)?);
                    } else {
                        for child in &children {
                            print!("{}", render_subtree(projector, child, 0, 2).await);
                        }
                    }
                }
            }
        }
        Commands::Watch { once } => {
            let mut tracker = Tracker::from_config(&config)?;
            let mut changes = tracker.notifier().subscribe();

            tracker.scheduler_mut().start().await;
            changes.mark_seen();
            print!("{}", render_roots(tracker.projector()));
            if once {
                tracker.scheduler_mut().stop();
                return Ok(());
            }

            loop {
                tokio::select! {
                    alive = changes.changed() => {
                        if !alive {
                            break;
                        }
                        println!();
                        print!("{}", render_roots(tracker.projector()));
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, stopping");
                        break;
                    }
                }
            }
            tracker.scheduler_mut().stop();
        }
        Commands::Classify { paths } => {
            let classifier = ArtifactClassifier::default();
            for path in paths {
                println!("{:<8} {}", classifier.classify(&path).to_string(), path.display());
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
