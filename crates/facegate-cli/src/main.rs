use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegate_core::{
    CaptureStep, DetectionResult, FixedLocation, GateSnapshot, ReplayCapability, ReplayEntry,
    ValidityEvaluator,
};
use facegate_hw::ImageDirCamera;
use facegate_session::{Config, Session, SessionEvent};
use facegate_store::{PhotoStore, RecordStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "facegate", about = "Face-validity gated photo capture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a capture session against recorded frames and detections
    Capture {
        /// Image directory to use as the camera (with optional front/ and rear/)
        #[arg(long)]
        frames: PathBuf,
        /// JSON-lines detection recording, one pass per line
        #[arg(long)]
        detections: PathBuf,
        /// Also capture a device photo with the rear camera
        #[arg(long)]
        manual_device_check: bool,
    },
    /// Show the stored capture record and photo files
    Show,
    /// Delete both photos and the stored capture record
    Clear,
    /// Evaluate a detection recording and print each verdict
    Check {
        /// JSON-lines detection recording
        recording: PathBuf,
        /// Only evaluate this line (1-based)
        #[arg(long)]
        line: Option<usize>,
        /// Frame width the recording was made at
        #[arg(long, default_value_t = 640)]
        width: u32,
        /// Frame height the recording was made at
        #[arg(long, default_value_t = 480)]
        height: u32,
        /// Validity TOML overriding FACEGATE_VALIDITY_FILE
        #[arg(long)]
        validity: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Capture {
            frames,
            detections,
            manual_device_check,
        } => {
            config.manual_device_check |= manual_device_check;
            capture(&config, &frames, &detections).await?;
        }
        Commands::Show => show(&config)?,
        Commands::Clear => clear(&config)?,
        Commands::Check {
            recording,
            line,
            width,
            height,
            validity,
        } => {
            if let Some(path) = validity {
                config.validity = facegate_session::config::load_validity(&path)?;
            }
            check(&config, &recording, line, width, height)?;
        }
    }

    Ok(())
}

async fn capture(config: &Config, frames: &Path, detections: &Path) -> Result<()> {
    let camera = ImageDirCamera::open(frames)
        .with_context(|| format!("cannot use {} as a camera", frames.display()))?;
    let capability = ReplayCapability::load(detections)?;
    let location = Arc::new(FixedLocation(config.location));

    let (session, mut events) =
        Session::start(config, Box::new(camera), Box::new(capability), location)?;
    let handle = session.handle().clone();

    println!(
        "session {} started (manual device check: {})",
        handle.session_id(),
        config.manual_device_check
    );
    println!("commands: c(onfirm), r(etry), s(tatus), q(uit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SessionEvent::Finished) => {
                    println!("capture finished");
                    break;
                }
                Some(event) => print_event(&event),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "c" | "confirm" => print_snapshot(&handle.confirm().await?),
                    "r" | "retry" => print_snapshot(&handle.retry().await?),
                    "s" | "status" => print_snapshot(&handle.status().await?),
                    "q" | "quit" => break,
                    "" => {}
                    other => eprintln!("unknown command: {other}"),
                }
            }
        }
    }

    drop(handle);
    session.close().await?;
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Captured {
            step,
            path,
            sequence,
            width,
            height,
            ..
        } => match path {
            Some(path) => println!("{step} photo saved to {} (frame {sequence}, {width}x{height})", path.display()),
            None => println!("{step} photo captured but not saved (frame {sequence})"),
        },
        SessionEvent::Retried { step } => println!("{step} photo discarded"),
        SessionEvent::ConfirmChanged { enabled } => {
            println!("confirm {}", if *enabled { "enabled" } else { "disabled" })
        }
        SessionEvent::OverlayChanged { valid } => {
            println!("face {}", if *valid { "in position" } else { "out of position" })
        }
        SessionEvent::CameraSwitched { facing } => println!("switched to {facing} camera"),
        SessionEvent::Finished => println!("capture finished"),
    }
}

fn print_snapshot(snap: &GateSnapshot) {
    println!(
        "state: {:?}  camera: {}  confirm: {}  retry: {}",
        snap.state,
        snap.facing,
        if snap.confirm_enabled { "on" } else { "off" },
        if snap.retry_visible { "shown" } else { "hidden" },
    );
}

fn show(config: &Config) -> Result<()> {
    let photos = PhotoStore::new(&config.data_dir);
    for step in [CaptureStep::Subject, CaptureStep::Device] {
        let path = photos.path(step);
        let status = if photos.exists(step) { "present" } else { "missing" };
        println!("{:<8} {status:<8} {}", step.as_str(), path.display());
    }

    let records = RecordStore::open(&config.db_path)
        .with_context(|| format!("cannot open {}", config.db_path.display()))?;
    match records.load()? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("no capture record"),
    }
    Ok(())
}

fn clear(config: &Config) -> Result<()> {
    let photos = PhotoStore::new(&config.data_dir);
    for step in [CaptureStep::Subject, CaptureStep::Device] {
        match photos.delete(step) {
            Ok(true) => println!("deleted {}", photos.path(step).display()),
            Ok(false) => {}
            Err(e) => tracing::warn!(%step, error = %e, "failed to delete photo"),
        }
    }

    let records = RecordStore::open(&config.db_path)?;
    if records.remove()? {
        println!("capture record removed");
    }
    Ok(())
}

fn check(config: &Config, recording: &Path, only: Option<usize>, width: u32, height: u32) -> Result<()> {
    let text = std::fs::read_to_string(recording)
        .with_context(|| format!("cannot read {}", recording.display()))?;
    let evaluator = ValidityEvaluator::new(config.validity);

    let (mut valid, mut total) = (0usize, 0usize);
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        if raw.trim().is_empty() || only.is_some_and(|n| n != line) {
            continue;
        }
        let entry: ReplayEntry =
            serde_json::from_str(raw).with_context(|| format!("line {line}: bad entry"))?;
        total += 1;

        let faces = match entry {
            ReplayEntry::Faces(faces) => faces,
            ReplayEntry::Failure { error } => {
                println!("line {line}: detection failed ({error}), treated as no face");
                continue;
            }
        };
        let result = DetectionResult {
            frame_width: width,
            frame_height: height,
            faces,
        };
        let Some(face) = ValidityEvaluator::select_face(&result.faces) else {
            println!("line {line}: no face");
            continue;
        };

        let verdict = evaluator.verdict(face, width, height);
        if verdict.is_valid() {
            valid += 1;
        }
        println!(
            "line {line}: {}  faces={} outside_points={}/{} yaw={:.1} pitch={:.1} roll={:.1}{}",
            if verdict.is_valid() { "valid" } else { "invalid" },
            result.faces.len(),
            verdict.outside_points,
            face.contour.len(),
            face.yaw,
            face.pitch,
            face.roll,
            if verdict.orientation_ok { "" } else { "  (orientation)" },
        );
    }

    println!("{valid}/{total} passes valid");
    Ok(())
}
