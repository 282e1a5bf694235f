// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use songweaver::model::FitOptions;
use songweaver::{
    CorpusOptions, ProjectLayout, RecurrentModel, SegmentPools, SequenceModel, SongCreator,
    SongweaverConfig,
};

#[derive(Parser, Debug)]
#[command(name = "songweaver")]
#[command(about = "Train per-section sequence models on MIDI songs and generate new ones")]
#[command(version)]
struct Cli {
    /// Parse the training songs and train the intro, middle and outro models
    #[arg(short, long)]
    train: bool,

    /// Generate a song with this name into nn_songs/
    #[arg(short, long, value_name = "NAME")]
    generate: Option<String>,

    /// Music genre (project directory under the root)
    #[arg(short = 'm', long = "music", value_name = "GENRE")]
    genre: Option<String>,

    /// Instrument (project directory under the genre)
    #[arg(short, long, value_name = "INSTRUMENT")]
    instrument: Option<String>,

    /// Also save full models to nn_models/ after training
    #[arg(short, long, requires = "train")]
    save: bool,

    /// Load saved full models instead of training
    #[arg(short, long, conflicts_with = "train")]
    load: bool,

    /// Directory holding the genre directories
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Configuration file (default: <project>/songweaver.yaml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reuse parsed notes instead of re-reading the training songs
    #[arg(long)]
    reuse_notes: bool,

    /// Seed for model initialization and sampling
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,songweaver=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Exit with a usage error (status 2)
fn usage_error(message: &str) -> ! {
    Cli::command().error(ErrorKind::MissingRequiredArgument, message).exit()
}

fn load_config(cli: &Cli, layout: &ProjectLayout) -> Result<SongweaverConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => Some(layout.config_path()).filter(|p| p.is_file()),
    };

    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            songweaver::config::validate_config(&path)?
        }
        None => SongweaverConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.model.seed = Some(seed);
        config.generation.seed = Some(seed);
    }
    Ok(config)
}

fn load_pools(cli: &Cli, layout: &ProjectLayout, options: &CorpusOptions) -> Result<SegmentPools> {
    let parsed_dir = layout.parsed_notes_dir();
    let have_pools = SegmentPools::exist_in(&parsed_dir);

    // Training re-reads the corpus unless told otherwise; generation reuses
    // the pools the models were trained on
    let reuse = have_pools && (cli.reuse_notes || !cli.train);
    if reuse {
        info!(dir = %parsed_dir.display(), "Reusing parsed notes");
        return SegmentPools::load(&parsed_dir).context("Failed to load parsed notes");
    }

    info!(dir = %layout.training_songs_dir().display(), "Parsing training songs");
    SongCreator::<RecurrentModel>::parse(layout, options).context("Failed to parse training songs")
}

/// Train, load or restore the section models as the flags ask.
///
/// Training always checkpoints weights to nn_weights/ so a later run can
/// generate from them; `--save` adds the full models.
fn prepare_models<M: SequenceModel>(cli: &Cli, creator: &mut SongCreator<M>, options: &FitOptions) -> Result<()> {
    if cli.train {
        creator.train(options, true)?;
        if cli.save {
            creator.save_models()?;
        }
    } else if cli.load {
        creator.load_models().context("Failed to load saved models")?;
    } else if cli.generate.is_some() {
        creator
            .load_weights()
            .context("Failed to load checkpointed weights; train first")?;
    }
    Ok(())
}

fn run(cli: &Cli, genre: &str, instrument: &str) -> Result<()> {
    let layout = ProjectLayout::new(&cli.root, genre, instrument);
    let config = load_config(cli, &layout)?;
    layout
        .ensure_dirs()
        .with_context(|| format!("Failed to create project directories under {:?}", layout.dir()))?;

    let pools = load_pools(cli, &layout, &config.corpus)?;
    let model_config = config.model.clone();
    let mut creator = SongCreator::from_pools(layout, pools, config.model.sequence_len, |_, encoder| {
        RecurrentModel::new(model_config.rnn_config(encoder.num_features()))
    })?;

    prepare_models(cli, &mut creator, &config.model.fit_options())?;

    if let Some(name) = &cli.generate {
        let mut rng = match config.generation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let path = creator.create_song(
            name,
            &config.song,
            config.generation.seed_mode,
            &config.render,
            &mut rng,
        )?;
        println!("Created {}", path.display());
    }

    Ok(())
}

fn main() {
    if std::env::args_os().len() < 2 {
        let _ = Cli::command().print_help();
        process::exit(1);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    init_tracing(cli.verbose);

    if !cli.train && cli.generate.is_none() && !cli.load {
        warn!("Nothing to do: pass --train, --load or --generate");
        let _ = Cli::command().print_help();
        process::exit(1);
    }

    let (genre, instrument) = match (&cli.genre, &cli.instrument) {
        (Some(genre), Some(instrument)) => (genre.clone(), instrument.clone()),
        _ => usage_error("--music <GENRE> and --instrument <INSTRUMENT> are required"),
    };

    if let Err(e) = run(&cli, &genre, &instrument) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
