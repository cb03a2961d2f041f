use clap::{Parser, Subcommand};
use cli::{CliConfig, load_request, request_files, response_path, save_response};
use color_eyre::eyre::{Result, eyre};
use room_geometry::{
    Canvas, CancellationSignal, Deadline, ErrorResponse, NeverCancel, RoomDetectionRequest, RoomDetectionResponse,
    RoomLayout, process_request,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect rooms for a single request file
    Detect {
        /// Path to the JSON request
        #[arg(short, long)]
        request: PathBuf,
        /// Optional TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Where to write the response JSON (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also export the rooms as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Abort if detection takes longer than this (overrides the config file)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Detect rooms for every *.json request in a directory
    Batch {
        /// Directory holding request files
        #[arg(short, long)]
        input_dir: PathBuf,
        /// Directory for response files
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Optional TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the JSON schema of the request (or response) body
    Schema {
        #[arg(long)]
        response: bool,
    },
    /// Print the default configuration as TOML
    DefaultConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Detect {
            request,
            config,
            output,
            geojson,
            timeout_ms,
        } => {
            let mut config = load_config(config.as_deref())?;
            if timeout_ms.is_some() {
                config.timeout_ms = *timeout_ms;
            }
            detect(request, &config, output.as_deref(), geojson.as_deref())?;
        }
        Commands::Batch {
            input_dir,
            output_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            batch(input_dir, output_dir, config).await?;
        }
        Commands::Schema { response } => {
            let schema = if *response {
                serde_json::to_string_pretty(&RoomDetectionResponse::schema())?
            } else {
                serde_json::to_string_pretty(&RoomDetectionRequest::schema())?
            };
            println!("{schema}");
        }
        Commands::DefaultConfig => {
            print!("{}", CliConfig::default().to_toml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Ok(CliConfig::from_file(path)?)
        }
        None => Ok(CliConfig::default()),
    }
}

fn cancel_signal(config: &CliConfig) -> Box<dyn CancellationSignal> {
    match config.timeout_ms {
        Some(ms) => Box::new(Deadline::after(Duration::from_millis(ms))),
        None => Box::new(NeverCancel),
    }
}

fn detect(request_path: &Path, config: &CliConfig, output: Option<&Path>, geojson: Option<&Path>) -> Result<()> {
    let request = load_request(request_path)?;
    info!("Detecting rooms from {} walls", request.walls.len());

    let response = match process_request(&request, &config.detection, cancel_signal(config).as_ref()) {
        Ok(response) => response,
        Err(err) => {
            let body = serde_json::to_string_pretty(&ErrorResponse::from(&err))?;
            match output {
                Some(path) => std::fs::write(path, body)?,
                None => println!("{body}"),
            }
            return Err(eyre!("Room detection failed: {err}"));
        }
    };

    if let Some(path) = geojson {
        let canvas = Canvas::new(
            response.metadata.image_dimensions[0],
            response.metadata.image_dimensions[1],
        );
        RoomLayout::new(canvas, response.rooms.clone()).save_geojson(path)?;
        info!("GeoJSON saved to: {:?}", path);
    }

    match output {
        Some(path) => {
            save_response(&response, path)?;
            info!("✅ Found {} rooms, response saved to: {:?}", response.total_rooms, path);
        }
        None => println!("{}", serde_json::to_string_pretty(&response)?),
    }

    Ok(())
}

async fn batch(input_dir: &Path, output_dir: &Path, config: CliConfig) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let files = request_files(input_dir)?;
    info!("Processing {} request files from {:?}", files.len(), input_dir);

    let config = Arc::new(config);
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let config = Arc::clone(&config);
        let target = response_path(&path, output_dir);
        handles.push(spawn_blocking(move || -> Result<(PathBuf, usize)> {
            let request = load_request(&path)?;
            let response = process_request(&request, &config.detection, cancel_signal(&config).as_ref())
                .map_err(|err| eyre!("{:?}: {err}", path))?;
            save_response(&response, &target)?;
            Ok((target, response.total_rooms))
        }));
    }

    let mut failures = 0;
    for handle in handles {
        match handle.await? {
            Ok((target, rooms)) => info!("{} rooms -> {:?}", rooms, target),
            Err(err) => {
                error!("{err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{failures} request(s) failed"));
    }
    info!("✅ Batch processing completed!");
    Ok(())
}
