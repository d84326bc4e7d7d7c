use anyhow::{Context, Result};
use clap::Parser;
use shelter::{
    config::ShelterConfig,
    model::{render_overlays, BufferId, ExtmarkSpec},
    plugin_api::{BufferSource, ShelterCommand},
    Shelter,
};
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::mpsc::Receiver,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Print env files with their secret values masked
#[derive(Parser, Debug)]
#[command(name = "shelter")]
#[command(about = "Print env files with secret values masked", long_about = None)]
#[command(version)]
struct Args {
    /// Env files to print
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to configuration file (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Leave this 1-based line of the first file unmasked, as if peeking at it
    #[arg(long, value_name = "LINE")]
    reveal_line: Option<usize>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    print_schema: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print cache statistics after rendering
    #[arg(long)]
    stats: bool,
}

/// Files loaded from disk, exposed to the shelter core as editor buffers
struct FileBuffers {
    files: Vec<(PathBuf, Vec<String>)>,
    cursor_line: Option<usize>,
}

impl FileBuffers {
    fn load(paths: &[PathBuf], cursor_line: Option<usize>) -> Result<Self> {
        let files = paths
            .iter()
            .map(|path| {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok((path.clone(), content.lines().map(str::to_string).collect()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { files, cursor_line })
    }

    fn ids(&self) -> impl Iterator<Item = BufferId> {
        (0..self.files.len()).map(BufferId)
    }
}

impl BufferSource for FileBuffers {
    fn get_lines(&self, buffer_id: BufferId) -> Option<Vec<String>> {
        self.files.get(buffer_id.0).map(|(_, lines)| lines.clone())
    }

    fn is_valid(&self, buffer_id: BufferId) -> bool {
        buffer_id.0 < self.files.len()
    }

    fn file_path(&self, buffer_id: BufferId) -> Option<PathBuf> {
        self.files.get(buffer_id.0).map(|(path, _)| path.clone())
    }

    fn cursor_line(&self, buffer_id: BufferId) -> Option<usize> {
        self.cursor_line.filter(|_| buffer_id == BufferId(0))
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::sync::Arc::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}

/// `--config`, else `<config dir>/shelter/config.json` when it exists, else defaults
fn load_config(explicit: Option<&Path>) -> Result<ShelterConfig> {
    if let Some(path) = explicit {
        return ShelterConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    let default_path = dirs::config_dir().map(|dir| dir.join("shelter").join("config.json"));
    match default_path {
        Some(path) if path.exists() => ShelterConfig::load_from_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        _ => {
            tracing::debug!("No config file found, using defaults");
            Ok(ShelterConfig::default())
        }
    }
}

/// Act as the host: apply overlay commands and run deferred batches until
/// the core has nothing left to do
fn drain_commands(
    shelter: &mut Shelter,
    buffers: &FileBuffers,
    rx: &Receiver<ShelterCommand>,
) -> HashMap<BufferId, Vec<ExtmarkSpec>> {
    let mut overlays: HashMap<BufferId, Vec<ExtmarkSpec>> = HashMap::new();
    while let Ok(command) = rx.try_recv() {
        match command {
            ShelterCommand::ClearOverlays { buffer_id } => {
                overlays.remove(&buffer_id);
            }
            ShelterCommand::AddOverlays {
                buffer_id,
                overlays: batch,
            } => overlays.entry(buffer_id).or_default().extend(batch),
            ShelterCommand::Defer {
                buffer_id,
                generation,
            } => {
                shelter.resume(buffers, buffer_id, generation);
            }
            other => tracing::debug!("Ignoring host command {:?}", other),
        }
    }
    overlays
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_schema {
        println!("{}", serde_json::to_string_pretty(&ShelterConfig::json_schema())?);
        return Ok(());
    }

    init_tracing(args.log_file.as_deref())?;

    let config = load_config(args.config.as_deref())?;
    let buffers = FileBuffers::load(&args.files, args.reveal_line)?;
    let (tx, rx) = std::sync::mpsc::channel();
    let mut shelter = Shelter::new(config, tx);

    for buffer_id in buffers.ids() {
        if !shelter.shelter_buffer(&buffers, buffer_id) {
            let path = buffers.file_path(buffer_id).unwrap_or_default();
            tracing::warn!("Skipping {}: not an env file", path.display());
            continue;
        }
        if args.reveal_line.is_some() && buffer_id == BufferId(0) {
            shelter.reveal_current_line(&buffers, buffer_id);
        }
    }

    let overlays = drain_commands(&mut shelter, &buffers, &rx);
    let show_headers = buffers.files.len() > 1;
    for (buffer_id, (path, lines)) in buffers.ids().zip(&buffers.files) {
        let Some(buffer_overlays) = overlays.get(&buffer_id) else {
            if !shelter.is_sheltered(buffer_id) {
                continue;
            }
            // Sheltered with nothing to mask
            print_file(path, lines, show_headers);
            continue;
        };
        print_file(path, &render_overlays(lines, buffer_overlays), show_headers);
    }

    if args.stats {
        eprintln!("{}", serde_json::to_string_pretty(&shelter.cache_stats())?);
    }

    shelter.shutdown();
    Ok(())
}

fn print_file(path: &Path, lines: &[String], show_header: bool) {
    if show_header {
        println!("==> {} <==", path.display());
    }
    for line in lines {
        println!("{}", line);
    }
}
