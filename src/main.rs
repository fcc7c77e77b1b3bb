use anyhow::Context;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

mod apply;
mod chat;
mod cli;
mod config;
mod errors;
mod extract;
mod fallback;
mod generate;
mod log;
mod prompt;
mod provider;
mod retry;
mod safety;
mod score;
mod server;
mod settings;
mod ux;
mod validate;
mod wire;

use cli::{Command, GenerateArgs, KeysCommand, ServeArgs};
use config::Config;

fn make_provider(cfg: &Config) -> anyhow::Result<provider::DynProvider> {
    let key = cfg.resolve_api_key();
    if key.is_none() {
        warn!(
            "{} is not set and no stored openai key was found; generation will return the fallback project",
            config::API_KEY_ENV
        );
    }
    Ok(provider::make_provider(&cfg.completion.api_base, key)?)
}

async fn run_serve(mut cfg: Config, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        cfg.server.addr = addr;
    }
    if let Some(model) = args.model {
        cfg.completion.model = model.clone();
        cfg.chat.model = model;
    }
    if let Some(t) = args.timeout_secs {
        cfg.completion.timeout_secs = t;
    }

    let prov = make_provider(&cfg)?;
    let state = server::AppState {
        generator: Arc::new(generate::Generator::new(
            prov.clone(),
            cfg.completion.clone(),
            cfg.retry.clone(),
            cfg.validation.clone(),
        )),
        assistant: Arc::new(chat::Assistant::new(prov, cfg.chat.clone(), cfg.retry.clone())),
    };
    info!(model = %cfg.completion.model, "starting service");
    server::serve(&cfg.server.addr, state).await
}

async fn run_generate(mut cfg: Config, args: GenerateArgs, debug: bool) -> anyhow::Result<()> {
    if let Some(model) = &args.model {
        cfg.completion.model = model.clone();
    }
    if let Some(t) = args.timeout_secs {
        cfg.completion.timeout_secs = t;
    }
    if args.no_retry {
        cfg.retry = retry::RetryPolicy::disabled();
    }

    let req = args.to_request();
    let generator = generate::Generator::new(
        make_provider(&cfg)?,
        cfg.completion.clone(),
        cfg.retry.clone(),
        cfg.validation.clone(),
    );

    let pb = (!args.no_progress && !args.json).then(|| ux::spinner("Generating Flutter project..."));
    let outcome = generator.generate(&req).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if args.save_artifacts {
        let tx = Uuid::new_v4();
        let mut saved = log::SavedPaths::new(Path::new(&cfg.root), tx);
        saved.save_stage("request", &req)?;
        if let Some(raw) = &outcome.raw {
            saved.save_text("completion.md", raw)?;
        }
        saved.save_stage("response", &outcome.response())?;
        if debug || !args.json {
            log::print_saved_paths(&saved);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.response())?);
    } else {
        ux::print_project_dashboard(&outcome);
    }

    if let Some(out) = &args.out {
        let summary = apply::write_project(out, &outcome.project, args.dry_run)
            .with_context(|| format!("exporting project to {}", out.display()))?;
        if !args.json {
            ux::print_apply_dashboard(&summary, args.dry_run);
        }
    }

    Ok(())
}

fn run_keys(cfg: &Config, action: KeysCommand) -> anyhow::Result<()> {
    let mut store = settings::ApiKeyStore::load(cfg.settings_path())?;
    match action {
        KeysCommand::Add { provider, key } => {
            let entry = store.add(provider, &key)?;
            println!("stored {} key {} in {}", format!("{provider:?}").to_lowercase(), entry.id, store.path().display());
        }
        KeysCommand::List => ux::print_keys(store.list()),
        KeysCommand::Remove { id } => {
            if store.remove(id)? {
                println!("removed {id}");
            } else {
                anyhow::bail!("no stored key with id {id}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(root) = &args.root {
        cfg.root = root.clone();
    }

    match args.command {
        Command::Serve(s) => run_serve(cfg, s).await,
        Command::Generate(g) => run_generate(cfg, g, args.debug).await,
        Command::Keys { action } => run_keys(&cfg, action),
    }
}
