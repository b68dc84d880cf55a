//! CLI for reel_engine: inspect compositions and timelines, derive profile and
//! vitals views from data files, and poll the Mission Control dashboard.

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}

#[cfg(not(target_arch = "wasm32"))]
mod app {
    use std::path::PathBuf;
    use std::time::Duration;

    use anyhow::Context;
    use clap::{Parser, Subcommand};
    use serde::Serialize;
    use tokio::sync::watch;
    use tokio_util::sync::CancellationToken;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    use reel_engine::dashboard::{
        poll_once, run_poller, DashboardClient, PollSchedule, SnapshotSource, SystemClock,
        TokioClock, WidgetState,
    };
    use reel_engine::{
        grade_color, load_profile, nio_tier_for_score, read_website_stats, CompositionRegistry,
        DashboardConfig, ProfileView,
    };

    #[derive(Parser)]
    #[command(name = "reelctl")]
    #[command(about = "reelctl: frame timelines, progression views, and Mission Control polling")]
    #[command(version)]
    struct Cli {
        #[command(subcommand)]
        command: Commands,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// List registered compositions with size and duration
        Compositions,

        /// Print a composition's scene map, or resolve a single frame
        Timeline {
            /// Composition id, e.g. ContentOsHighlight
            #[arg(long)]
            composition: String,

            /// Resolve this global frame instead of printing the map
            #[arg(long, allow_hyphen_values = true)]
            frame: Option<i64>,
        },

        /// Derive the avatar badge view from profile.json
        Profile {
            /// Directory holding profile.json (overrides REEL_DATA_ROOT)
            #[arg(long)]
            data_root: Option<PathBuf>,
        },

        /// Summarise website-stats.json
        Vitals {
            /// Directory holding website-stats.json (overrides REEL_DATA_ROOT)
            #[arg(long)]
            data_root: Option<PathBuf>,
        },

        /// Poll every dashboard endpoint until Ctrl-C
        Poll {
            /// Fetch each endpoint once and exit
            #[arg(long)]
            once: bool,
        },

        /// Trigger the ops pipeline, then refresh today's focus
        RunPipeline,
    }

    pub async fn run() -> anyhow::Result<()> {
        dotenvy::dotenv().ok();

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "reel_engine=info,reelctl=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();

        let cli = Cli::parse();
        let config = DashboardConfig::from_env().context("loading dashboard configuration")?;
        tracing::debug!(base_url = %config.base_url, data_root = %config.data_root.display(), "Loaded configuration");

        match cli.command {
            Commands::Compositions => compositions(),
            Commands::Timeline { composition, frame } => timeline(&composition, frame),
            Commands::Profile { data_root } => {
                profile(&data_root.unwrap_or_else(|| config.data_root.clone()))
            }
            Commands::Vitals { data_root } => {
                vitals(&data_root.unwrap_or_else(|| config.data_root.clone()))
            }
            Commands::Poll { once } => poll(&config, once).await,
            Commands::RunPipeline => run_pipeline(&config).await,
        }
    }

    fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn compositions() -> anyhow::Result<()> {
        let registry = CompositionRegistry::builtin();
        registry.validate()?;
        println!(
            "{:<22} {:>10} {:>6} {:>5} {:>8}",
            "ID", "SIZE", "FRAMES", "FPS", "SECONDS"
        );
        for spec in registry.compositions() {
            println!(
                "{:<22} {:>10} {:>6} {:>5} {:>8.1}",
                spec.id,
                format!("{}x{}", spec.width, spec.height),
                spec.duration_in_frames,
                spec.fps.as_u32(),
                spec.duration_secs()
            );
        }
        Ok(())
    }

    fn timeline(composition: &str, frame: Option<i64>) -> anyhow::Result<()> {
        let registry = CompositionRegistry::builtin();
        let timeline = registry.timeline(composition)?;

        if let Some(frame) = frame {
            return print_json(&timeline.position_at(frame));
        }

        let table = timeline.table();
        println!(
            "{} (table {} v{}, {} frames @ {} fps)",
            composition,
            table.id,
            table.version,
            timeline.total_frames(),
            table.fps.as_u32()
        );
        for (index, scene) in table.scenes.iter().enumerate() {
            if let Some(range) = timeline.scene_range(index) {
                println!(
                    "  {:<14} [{:>5}, {:>5})  {:>4} frames",
                    scene.id,
                    range.start,
                    range.end,
                    range.duration()
                );
            }
        }
        for (outgoing, window) in timeline.transition_windows() {
            println!(
                "  transition {} -> {}  [{:>5}, {:>5})",
                outgoing,
                outgoing + 1,
                window.start,
                window.end
            );
        }
        Ok(())
    }

    fn profile(data_root: &std::path::Path) -> anyhow::Result<()> {
        let profile = load_profile(&data_root.join("profile.json"));
        print_json(&ProfileView::derive(profile.as_ref()))
    }

    fn vitals(data_root: &std::path::Path) -> anyhow::Result<()> {
        let path = data_root.join("website-stats.json");
        let stats = read_website_stats(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let tier = nio_tier_for_score(stats.total_score);

        println!(
            "score {}  grade {} ({})  nio tier {} {}  generated {}",
            stats.total_score,
            stats.grade,
            grade_color(&stats.grade),
            tier.tier,
            tier.name,
            stats.generated_at
        );
        for site in stats.sites.iter() {
            println!(
                "  {:<10} score {:>6}  grade {:<2}  loc {:>7}  routes {:>3}  components {:>3}",
                site.name,
                site.score,
                site.grade,
                site.total_loc(),
                site.routes,
                site.components
            );
        }
        println!("  combined loc {}", stats.combined_loc());
        Ok(())
    }

    async fn poll(config: &DashboardConfig, once: bool) -> anyhow::Result<()> {
        let client = DashboardClient::from_config(config)?;

        let nio = {
            let c = client.clone();
            move || {
                let c = c.clone();
                async move { c.nio_status().await }
            }
        };
        let metrics = {
            let c = client.clone();
            move || {
                let c = c.clone();
                async move { c.system_metrics().await }
            }
        };
        let session = {
            let c = client.clone();
            move || {
                let c = c.clone();
                async move { c.session_status().await }
            }
        };
        let enhanced = {
            let c = client.clone();
            move || {
                let c = c.clone();
                async move { c.enhanced_data().await }
            }
        };

        if once {
            once_and_print(&nio, WidgetState::new("nio-status")).await?;
            once_and_print(&metrics, WidgetState::new("system-metrics")).await?;
            once_and_print(&session, WidgetState::new("openclaw-status")).await?;
            once_and_print(&enhanced, WidgetState::new("enhanced-data")).await?;
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let mut tasks = tokio::task::JoinSet::new();
        spawn_widget(&mut tasks, nio, "nio-status", config.nio_status_interval, &cancel);
        spawn_widget(
            &mut tasks,
            metrics,
            "system-metrics",
            config.system_metrics_interval,
            &cancel,
        );
        spawn_widget(
            &mut tasks,
            session,
            "openclaw-status",
            config.session_status_interval,
            &cancel,
        );
        spawn_widget(
            &mut tasks,
            enhanced,
            "enhanced-data",
            config.memories_interval,
            &cancel,
        );

        tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl-C")?;
        tracing::info!("Shutting down pollers");
        cancel.cancel();
        while tasks.join_next().await.is_some() {}
        Ok(())
    }

    async fn once_and_print<S>(source: &S, mut widget: WidgetState<S::Item>) -> anyhow::Result<()>
    where
        S: SnapshotSource,
        S::Item: Serialize,
    {
        poll_once(source, &mut widget, &SystemClock).await;
        println!("== {} ==", widget.name());
        match widget.value() {
            Some(value) => print_json(value),
            None => {
                println!("(no data yet)");
                Ok(())
            }
        }
    }

    fn spawn_widget<S>(
        tasks: &mut tokio::task::JoinSet<()>,
        source: S,
        name: &'static str,
        interval: Duration,
        cancel: &CancellationToken,
    ) where
        S: SnapshotSource + 'static,
        S::Item: Clone + Serialize + Send + Sync + 'static,
    {
        let (tx, mut rx) = watch::channel(None);
        tasks.spawn({
            let cancel = cancel.clone();
            async move {
                run_poller(
                    source,
                    WidgetState::new(name),
                    PollSchedule::new(interval),
                    TokioClock::new(),
                    cancel,
                    tx,
                )
                .await;
            }
        });
        tasks.spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                if let Some(value) = snapshot {
                    match serde_json::to_string(&value) {
                        Ok(json) => println!("[{}] {}", name, json),
                        Err(e) => tracing::warn!(widget = name, error = %e, "Cannot render update"),
                    }
                }
            }
        });
    }

    async fn run_pipeline(config: &DashboardConfig) -> anyhow::Result<()> {
        let client = DashboardClient::from_config(config)?;
        let outcome = client.run_pipeline().await?;
        if !outcome.run.steps.is_empty() {
            println!("steps: {}", outcome.run.steps.join(", "));
        }
        println!("top blocker: {}", outcome.focus.top_blocker());
        println!("next action: {}", outcome.focus.next_action());
        Ok(())
    }
}
