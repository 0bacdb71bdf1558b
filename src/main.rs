use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use appforge::build::{BuildRequest, BuildState, BuildTracker, HttpBuildClient, RetryPolicy};
use appforge::cli::{Args, Command};
use appforge::config::{default_config_path, Config};
use appforge::{emit, package, Snapshot};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = Config::load_or_default(&config_path)?;

    match args.command {
        Command::Generate { snapshot, out, archive } => {
            let snap = load_snapshot(&snapshot)?;
            let files = emit::emit(&snap)?;

            let out_root = out.unwrap_or_else(|| cfg.output.dir.clone());
            let project_root = package::materialize(&snap, &files, &out_root)?;
            info!(
                files = files.len(),
                root = %project_root.display(),
                "project generated"
            );
            println!("{}", project_root.display());

            if let Some(archive_path) = archive {
                let bytes = package::archive(&files)?;
                std::fs::write(&archive_path, bytes)
                    .with_context(|| format!("writing {}", archive_path.display()))?;
                info!(path = %archive_path.display(), "archive written");
            }
        }

        Command::Build { snapshot, no_wait } => {
            let snap = load_snapshot(&snapshot)?;
            let files = emit::emit(&snap)?;
            let bytes = package::archive(&files)?;

            let server = &cfg.build_server;
            let client = HttpBuildClient::new(
                server.url.clone(),
                server.api_key.clone(),
                server.timeout(),
            )?;
            let policy = RetryPolicy {
                max_attempts: server.max_attempts,
                base_delay: server.backoff(),
            };
            let tracker = BuildTracker::new(client, policy);

            let request = BuildRequest {
                package_id: snap.application.package_name.clone(),
                app_name: snap.application.name.clone(),
                version: snap.application.version.clone(),
                archive: bytes,
            };
            tracker.submit(&request)?;
            println!("build {} submitted", tracker.build_id());

            if !no_wait {
                let state = tracker.track(server.poll_interval(), server.max_polls)?;
                match state {
                    BuildState::Succeeded => {
                        match tracker.artifact_url() {
                            Some(url) => println!("build succeeded: {url}"),
                            None => println!("build succeeded"),
                        }
                    }
                    other => anyhow::bail!("build finished as {other}"),
                }
            }
        }
    }

    Ok(())
}

fn load_snapshot(path: &std::path::Path) -> Result<Snapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snap = Snapshot::from_json(&text)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(snap)
}
