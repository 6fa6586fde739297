mod app;
mod cli;
mod config;

use anyhow::{Context as _, Result};
use app::Frontend;
use chrono::Utc;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use emostroop_core::ParticipantId;
use emostroop_experiment::{
    assemble_blocks, log_mapping, prompt_participant, Context, CsvLog, ImagePools, Session,
    SessionOutcome, SessionSummary,
};
use emostroop_render::load_font;
use emostroop_trigger::TriggerSink;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "emostroop=info,emostroop_experiment=info,emostroop_trigger=info",
        1 => "emostroop=debug,emostroop_experiment=debug,emostroop_trigger=debug,emostroop_render=debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Takes `--participant` when it is valid, otherwise asks the operator.
fn participant(cli: &Cli) -> Result<Option<ParticipantId>> {
    if let Some(raw) = &cli.participant {
        match raw.parse::<ParticipantId>() {
            Ok(id) => {
                log_mapping(&id);
                return Ok(Some(id));
            }
            Err(e) => warn!("Ignoring --participant {:?}: {}", raw, e),
        }
    }
    Ok(prompt_participant(io::stdin().lock(), io::stdout())?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply(&cli);
    config.validate()?;

    let Some(participant) = participant(&cli)? else {
        info!("No participant ID entered");
        return Ok(());
    };

    let mut rng = match config.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let mut pools = ImagePools::load(&config.assets_dir)
        .with_context(|| format!("loading images from {}", config.assets_dir.display()))?;
    pools.shuffle(&mut rng);
    let blocks = assemble_blocks(
        &pools,
        &participant,
        config.experiment.images_per_bucket,
        &mut rng,
    )?;

    let triggers = emostroop_trigger::open(&config.trigger);
    info!("Trigger channel: {}", triggers.describe());

    let started = Utc::now();
    let (log, log_path) = CsvLog::create(&config.data_dir, &participant, started)?;

    let font = config.display.font.as_deref().and_then(|path| {
        load_font(path)
            .map_err(|e| warn!("Font unavailable: {:#}", e))
            .ok()
    });
    let (scheduler, display) = Frontend::open(config.display.clone(), font)?;

    let keymap = participant.keymap();
    let mut ctx = Context::new(
        scheduler,
        display,
        triggers,
        rng,
        config.experiment.clone(),
        keymap,
    );
    let mut session = Session::new(participant, blocks, log);
    let report = session.run(&mut ctx)?;

    let summary = SessionSummary::new(session.participant(), started, &report);
    summary.log();
    summary.write(&config.data_dir)?;

    match report.outcome {
        SessionOutcome::Completed => info!("Session complete, data in {}", log_path.display()),
        SessionOutcome::Aborted => warn!("Session aborted, partial data in {}", log_path.display()),
    }
    Ok(())
}
