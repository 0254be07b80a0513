use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use facecheck_core::backend::infrastructure::http_client::HttpCheckInClient;
use facecheck_core::capture::infrastructure::mjpeg_camera::MjpegCamera;
use facecheck_core::detection::infrastructure::stub_engine::StubEngine;
use facecheck_core::session::config::SessionConfig;
use facecheck_core::session::controller::{CameraFactory, Session};
use facecheck_core::session::events::SessionEvent;
use facecheck_core::session::lifecycle::{CaptureMode, RequestLifecycle};

/// Face check-in against a verification backend.
#[derive(Parser)]
#[command(name = "facecheck")]
struct Cli {
    /// Base URL of the verification backend.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    backend_url: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Watch a camera stream and check in automatically on a sustained
    /// detection.
    Live {
        /// HTTP MJPEG stream or JPEG snapshot URL.
        #[arg(long)]
        camera_url: String,
    },
    /// Check in with a single image file.
    Checkin {
        /// Image to scan and submit.
        image: PathBuf,
    },
    /// Register a new identity from an image file.
    Register {
        /// Image to enrol.
        image: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let client = Arc::new(HttpCheckInClient::new(&cli.backend_url)?);
    match cli.command {
        CliCommand::Live { camera_url } => run_live(client, camera_url),
        CliCommand::Checkin { image } => run_checkin(client, &image),
        CliCommand::Register { image, name, code } => {
            run_register(client, &image, name, code)
        }
    }
}

fn spawn_session(client: Arc<HttpCheckInClient>, camera: CameraFactory) -> Session {
    Session::spawn(
        Box::new(StubEngine::new()),
        camera,
        client,
        SessionConfig::default(),
    )
}

fn run_live(
    client: Arc<HttpCheckInClient>,
    camera_url: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = spawn_session(
        client,
        Box::new(move || Box::new(MjpegCamera::new(camera_url.clone()))),
    );
    let events = session.events();
    session.set_mode(CaptureMode::Live);

    loop {
        match events.recv()? {
            SessionEvent::CaptureUnavailable(message) => {
                return Err(message.into());
            }
            event => report(&event),
        }
    }
}

fn run_checkin(
    client: Arc<HttpCheckInClient>,
    image: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(image)
        .map_err(|e| format!("could not read {}: {e}", image.display()))?;
    let session = spawn_session(client, Box::new(no_camera));
    let events = session.events();
    session.load_still(bytes);

    loop {
        let event = events.recv_timeout(Duration::from_secs(120))?;
        report(&event);
        match event {
            // Scan finished: submit the descriptor, or the raw image when
            // no face was found.
            SessionEvent::DetectionChanged(_) => session.check_in(),
            SessionEvent::CheckIn(lifecycle) => match lifecycle {
                RequestLifecycle::Succeeded { .. } => return Ok(()),
                RequestLifecycle::Failed { message } => return Err(message.into()),
                _ => {}
            },
            _ => {}
        }
    }
}

fn run_register(
    client: Arc<HttpCheckInClient>,
    image: &PathBuf,
    name: String,
    code: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(image)
        .map_err(|e| format!("could not read {}: {e}", image.display()))?;
    let session = spawn_session(client, Box::new(no_camera));
    let events = session.events();
    session.set_registration_name(name);
    session.set_registration_code(code);
    session.set_registration_image(bytes);
    session.submit_registration();

    loop {
        let event = events.recv_timeout(Duration::from_secs(120))?;
        report(&event);
        if let SessionEvent::Registration(lifecycle) = event {
            match lifecycle {
                RequestLifecycle::Succeeded { .. } => return Ok(()),
                RequestLifecycle::Failed { message } => return Err(message.into()),
                _ => {}
            }
        }
    }
}

/// A capture factory for still-only runs; live mode is never entered.
fn no_camera() -> Box<dyn facecheck_core::capture::domain::capture_source::CaptureSource> {
    Box::new(MjpegCamera::new("http://127.0.0.1:1/unused"))
}

fn report(event: &SessionEvent) {
    match event {
        SessionEvent::ModeChanged(mode) => log::info!("mode: {mode:?}"),
        SessionEvent::CaptureUnavailable(message) => log::error!("capture: {message}"),
        SessionEvent::DetectionChanged(Some(view)) => {
            let (x, y) = view.landmarks.center();
            log::info!("face at ({x:.0}, {y:.0})");
        }
        SessionEvent::DetectionChanged(None) => log::info!("no face"),
        SessionEvent::StillLoaded { width, height } => {
            log::info!("image loaded ({width}x{height})");
        }
        SessionEvent::AutoSubmitArmed => log::info!("hold still, checking in shortly"),
        SessionEvent::AutoSubmitCancelled => log::info!("check-in cancelled"),
        SessionEvent::CheckIn(lifecycle) => print_lifecycle("check-in", lifecycle),
        SessionEvent::Registration(lifecycle) => print_lifecycle("registration", lifecycle),
        SessionEvent::RegistrationFormCleared => log::info!("registration form cleared"),
    }
}

fn print_lifecycle(flow: &str, lifecycle: &RequestLifecycle) {
    match lifecycle {
        RequestLifecycle::Idle => {}
        RequestLifecycle::InFlight => log::info!("{flow}: submitting"),
        RequestLifecycle::Succeeded { message } | RequestLifecycle::Failed { message } => {
            println!("{message}");
        }
    }
}
