mod app;
mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use coordinator::{Coordinator, NavigationEvent, RouteDriver, StageEvent};
use serde::Serialize;
use shared::{Route, RouteAction};
use store::RouteStore;
use tokio::{sync::broadcast, task::LocalSet};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{app::Prototype, config::Settings};

/// Drives the navigation prototype through a sequence of routes.
#[derive(Parser, Debug)]
struct Args {
    /// Config file (defaults to ./navdemo.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the final report as JSON.
    #[arg(long)]
    json: bool,
    /// Sign in as this user after the routes were applied.
    #[arg(long)]
    sign_in: Option<String>,
    /// Sign out again at the end.
    #[arg(long)]
    sign_out: bool,
    /// Routes to visit in order, e.g. `auth/signIn/fp/sent`.
    routes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    route: Route,
    user: Option<String>,
    stage: Vec<StageEvent>,
    events: Vec<NavigationEvent>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load_settings(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    LocalSet::new().run_until(run(args, settings)).await
}

async fn run(args: Args, settings: Settings) -> Result<()> {
    let prototype = Prototype::build(&settings);
    let mut events = prototype.context.subscribe_events();
    let patience = settings.transition_delay() * 20 + Duration::from_secs(2);

    let driver = RouteDriver::new(
        prototype.root.clone(),
        prototype.store.as_ref(),
        prototype.context.clone(),
    );
    let driving = tokio::task::spawn_local(driver.run());
    wait_for_first_scene(&mut events, patience).await;

    let mut journal = Vec::new();
    for raw in &args.routes {
        let route = settings.parse_route(raw);
        if route == prototype.store.route() {
            info!(route = %route, "navdemo: already there");
            continue;
        }
        prototype.store.set_route(RouteAction::Goto(route.clone()));
        let rendered = wait_for_render(&mut events, &mut journal, patience)
            .await
            .with_context(|| format!("route '{route}' was not rendered"))?;
        if rendered != route {
            warn!(requested = %route, rendered = %rendered, "navdemo: route partially rendered");
        }
    }

    if let Some(user) = args.sign_in {
        prototype.sign_in(user);
        wait_for_render(&mut events, &mut journal, patience)
            .await
            .context("sign-in redirect was not rendered")?;
    }

    if args.sign_out && prototype.store.state().app.user.is_some() {
        prototype.sign_out();
        wait_for_render(&mut events, &mut journal, patience)
            .await
            .context("sign-out redirect was not rendered")?;
    }

    if driving.is_finished() {
        driving.await.context("route driver panicked")??;
    } else {
        driving.abort();
    }

    let report = Report {
        route: prototype.root.route(),
        user: prototype.store.state().app.user,
        stage: prototype.stage.take_events(),
        events: journal,
    };
    print_report(&report, args.json)
}

async fn wait_for_first_scene(events: &mut broadcast::Receiver<NavigationEvent>, patience: Duration) {
    let started = tokio::time::timeout(patience, async {
        loop {
            match events.recv().await {
                Ok(NavigationEvent::SceneChanged { .. }) => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    })
    .await;
    if !matches!(started, Ok(true)) {
        warn!("navdemo: no scene shown for the initial route");
    }
}

/// Waits for the next `Rendered` event, collecting everything seen on the way.
async fn wait_for_render(
    events: &mut broadcast::Receiver<NavigationEvent>,
    journal: &mut Vec<NavigationEvent>,
    patience: Duration,
) -> Result<Route> {
    tokio::time::timeout(patience, async {
        loop {
            let event = events.recv().await.context("navigation event bus")?;
            journal.push(event.clone());
            if let NavigationEvent::Rendered { route } = event {
                return Ok::<_, anyhow::Error>(route);
            }
        }
    })
    .await
    .context("timed out waiting for the transition")?
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("route: {}", report.route);
    if let Some(user) = &report.user {
        println!("user:  {user}");
    }
    println!("stage:");
    for event in &report.stage {
        println!("  {}", describe(event));
    }
    Ok(())
}

fn describe(event: &StageEvent) -> String {
    match event {
        StageEvent::ModalPresented { parent, modal } => format!("present {modal} over {parent}"),
        StageEvent::ModalDismissed { modal } => format!("dismiss {modal}"),
        StageEvent::StackSet {
            stack,
            views,
            animated,
        } => {
            let views: Vec<String> = views.iter().map(ToString::to_string).collect();
            let mode = if *animated { "animated" } else { "instant" };
            format!("stack {stack} = [{}] ({mode})", views.join(", "))
        }
        StageEvent::ChildReplaced {
            container,
            old,
            new,
        } => {
            let name = |view: &Option<coordinator::ViewHandle>| {
                view.as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string)
            };
            format!("container {container}: {} -> {}", name(old), name(new))
        }
    }
}
