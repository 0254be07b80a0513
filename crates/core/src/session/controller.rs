use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{never, Receiver, Sender};

use crate::capture::domain::capture_source::CaptureSource;
use crate::capture::infrastructure::still_image;
use crate::detection::domain::face_engine::FaceEngine;
use crate::session::checkin::{CheckInFlow, CheckInPayload, SubmitStart};
use crate::session::config::SessionConfig;
use crate::session::events::{DetectionView, SessionEvent};
use crate::session::lifecycle::{CaptureMode, RequestLifecycle};
use crate::session::poller::PollingSession;
use crate::session::registration::{RegistrationFlow, RegistrationStart};
use crate::session::updates::{StillScan, Update};
use crate::shared::descriptor::Descriptor;

const MSG_BAD_IMAGE: &str = "The selected file is not a readable image.";

/// Factory for live capture sources; invoked on every entry into live mode
/// so each polling session gets a fresh device handle.
pub type CameraFactory = Box<dyn FnMut() -> Box<dyn CaptureSource> + Send>;

enum Command {
    SetMode(CaptureMode),
    LoadStill(Vec<u8>),
    CheckIn,
    SetRegistrationName(String),
    SetRegistrationCode(String),
    SetRegistrationImage(Vec<u8>),
    SubmitRegistration,
    Reset,
    Shutdown,
}

/// Handle to a running session.
///
/// All methods enqueue work for the session's control loop; observable
/// state comes back exclusively through the [`SessionEvent`] channel. The
/// session starts in still mode with nothing loaded.
pub struct Session {
    commands: Sender<Command>,
    events: Receiver<SessionEvent>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Session {
    pub fn spawn(
        engine: Box<dyn FaceEngine>,
        camera: CameraFactory,
        client: Arc<dyn crate::backend::domain::check_in_client::CheckInClient>,
        config: SessionConfig,
    ) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (update_tx, update_rx) = crossbeam_channel::unbounded();

        let controller = Controller {
            config,
            engine: Arc::new(Mutex::new(engine)),
            camera,
            events: event_tx,
            update_tx,
            update_rx,
            mode: CaptureMode::Still,
            generation: 0,
            poller: None,
            descriptor: None,
            still_image: None,
            trigger: never(),
            trigger_pending: false,
            checkin: CheckInFlow::new(client.clone()),
            registration: RegistrationFlow::new(client),
        };
        let thread = thread::spawn(move || controller.run(command_rx));

        Self {
            commands: command_tx,
            events: event_rx,
            thread: Some(thread),
        }
    }

    /// The session's event stream. Receivers can be cloned and handed to
    /// any subscriber.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events.clone()
    }

    pub fn set_mode(&self, mode: CaptureMode) {
        self.send(Command::SetMode(mode));
    }

    /// Decode an uploaded image and scan it for a face. Implies still
    /// mode; the session switches first when needed.
    pub fn load_still(&self, bytes: Vec<u8>) {
        self.send(Command::LoadStill(bytes));
    }

    /// Submit a check-in for whatever the session currently holds: the
    /// live descriptor, or the loaded still image as a fallback.
    pub fn check_in(&self) {
        self.send(Command::CheckIn);
    }

    pub fn set_registration_name(&self, name: String) {
        self.send(Command::SetRegistrationName(name));
    }

    pub fn set_registration_code(&self, code: String) {
        self.send(Command::SetRegistrationCode(code));
    }

    pub fn set_registration_image(&self, bytes: Vec<u8>) {
        self.send(Command::SetRegistrationImage(bytes));
    }

    pub fn submit_registration(&self) {
        self.send(Command::SubmitRegistration);
    }

    /// Clear detection and result state without changing mode.
    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    fn send(&self, command: Command) {
        let _ = self.commands.send(command);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("session control loop panicked");
            }
        }
    }
}

struct Controller {
    config: SessionConfig,
    engine: Arc<Mutex<Box<dyn FaceEngine>>>,
    camera: CameraFactory,
    events: Sender<SessionEvent>,
    update_tx: Sender<Update>,
    update_rx: Receiver<Update>,
    mode: CaptureMode,
    /// Bumped on every mode switch; completions carrying an older value
    /// are discarded instead of touching current state.
    generation: u64,
    poller: Option<PollingSession>,
    descriptor: Option<Descriptor>,
    still_image: Option<Vec<u8>>,
    /// One-shot auto-submit timer; `never()` while disarmed.
    trigger: Receiver<Instant>,
    trigger_pending: bool,
    checkin: CheckInFlow,
    registration: RegistrationFlow,
}

impl Controller {
    fn run(mut self, commands: Receiver<Command>) {
        loop {
            // The trigger receiver is swapped on arm/cancel, so take fresh
            // clones each iteration.
            let updates = self.update_rx.clone();
            let trigger = self.trigger.clone();
            crossbeam_channel::select! {
                recv(commands) -> msg => match msg {
                    Ok(Command::Shutdown) | Err(_) => break,
                    Ok(command) => self.handle_command(command),
                },
                recv(updates) -> msg => {
                    if let Ok(update) = msg {
                        self.handle_update(update);
                    }
                }
                recv(trigger) -> _ => self.on_trigger(),
            }
        }
        self.stop_polling();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetMode(mode) => self.enter_mode(mode),
            Command::LoadStill(bytes) => self.load_still(bytes),
            Command::CheckIn => self.check_in(),
            Command::SetRegistrationName(name) => self.registration.set_name(name),
            Command::SetRegistrationCode(code) => self.registration.set_code(code),
            Command::SetRegistrationImage(bytes) => self.registration.set_image(bytes),
            Command::SubmitRegistration => self.submit_registration(),
            Command::Reset => self.reset_capture_state(),
            Command::Shutdown => unreachable!("handled in run"),
        }
    }

    /// Tear down the previous capture mode and bring up the requested one.
    /// Runs the full teardown even when re-entering the current mode, which
    /// restarts a live camera.
    fn enter_mode(&mut self, mode: CaptureMode) {
        log::info!("entering {mode:?} mode");
        self.stop_polling();
        self.generation += 1;
        self.cancel_trigger();
        self.descriptor = None;
        self.still_image = None;
        self.checkin.reset();
        self.mode = mode;

        self.emit(SessionEvent::ModeChanged(mode));
        self.emit(SessionEvent::DetectionChanged(None));
        self.emit(SessionEvent::CheckIn(RequestLifecycle::Idle));

        if mode == CaptureMode::Live {
            let source = (self.camera)();
            self.poller = Some(PollingSession::spawn(
                self.generation,
                source,
                self.engine.clone(),
                self.update_tx.clone(),
                self.config.poll_interval,
            ));
        }
    }

    fn load_still(&mut self, bytes: Vec<u8>) {
        if self.mode != CaptureMode::Still {
            self.enter_mode(CaptureMode::Still);
        }
        self.still_image = Some(bytes.clone());
        self.descriptor = None;

        let generation = self.generation;
        let engine = self.engine.clone();
        let updates = self.update_tx.clone();
        thread::spawn(move || {
            let result = scan_still(&bytes, &engine);
            let _ = updates.send(Update::StillReady { generation, result });
        });
    }

    fn check_in(&mut self) {
        let payload = match (&self.descriptor, &self.still_image) {
            (Some(descriptor), _) => Some(CheckInPayload::Descriptor(descriptor.clone())),
            (None, Some(image)) => Some(CheckInPayload::Image(image.clone())),
            (None, None) => None,
        };
        self.start_check_in(payload);
    }

    fn start_check_in(&mut self, payload: Option<CheckInPayload>) {
        match self.checkin.submit(self.generation, payload, &self.update_tx) {
            SubmitStart::Started => {
                if let Some(poller) = &self.poller {
                    poller.pause();
                }
                self.emit(SessionEvent::CheckIn(RequestLifecycle::InFlight));
            }
            SubmitStart::RefusedNoPayload => {
                self.emit(SessionEvent::CheckIn(self.checkin.lifecycle().clone()));
            }
            SubmitStart::RefusedBusy => {}
        }
    }

    fn submit_registration(&mut self) {
        match self.registration.submit(&self.update_tx) {
            RegistrationStart::Started => {
                self.emit(SessionEvent::Registration(RequestLifecycle::InFlight));
            }
            RegistrationStart::RefusedInvalid(_) => {
                self.emit(SessionEvent::Registration(
                    self.registration.lifecycle().clone(),
                ));
            }
            RegistrationStart::RefusedBusy => {}
        }
    }

    fn reset_capture_state(&mut self) {
        self.cancel_trigger();
        self.descriptor = None;
        self.still_image = None;
        self.checkin.reset();
        self.emit(SessionEvent::DetectionChanged(None));
        self.emit(SessionEvent::CheckIn(RequestLifecycle::Idle));
    }

    fn on_trigger(&mut self) {
        self.trigger = never();
        self.trigger_pending = false;
        if self.checkin.is_in_flight() {
            return;
        }
        let Some(descriptor) = self.descriptor.clone() else {
            return;
        };
        log::info!("auto-submitting check-in");
        self.start_check_in(Some(CheckInPayload::Descriptor(descriptor)));
    }

    fn handle_update(&mut self, update: Update) {
        match update {
            Update::Detection { generation, outcome } => {
                if generation != self.generation {
                    return;
                }
                self.apply_detection(outcome);
            }
            Update::PollFailed { generation, message } => {
                if generation != self.generation {
                    return;
                }
                log::error!("live capture failed: {message}");
                self.stop_polling();
                self.cancel_trigger();
                self.descriptor = None;
                self.emit(SessionEvent::CaptureUnavailable(message));
            }
            Update::StillReady { generation, result } => {
                if generation != self.generation {
                    return;
                }
                self.apply_still(result);
            }
            Update::CheckInSettled { generation, result } => {
                if generation != self.generation {
                    log::info!("discarding check-in result from a previous session");
                    return;
                }
                let lifecycle = self.checkin.settle(result);
                // Resume regardless of outcome so detection and arming
                // continue.
                if let Some(poller) = &self.poller {
                    poller.resume();
                }
                match self.mode {
                    CaptureMode::Live => self.descriptor = None,
                    CaptureMode::Still => {
                        if matches!(lifecycle, RequestLifecycle::Succeeded { .. }) {
                            self.descriptor = None;
                            self.still_image = None;
                        }
                    }
                }
                self.emit(SessionEvent::CheckIn(lifecycle));
            }
            Update::RegistrationSettled { result } => {
                let (lifecycle, cleared) = self.registration.settle(result);
                self.emit(SessionEvent::Registration(lifecycle));
                if cleared {
                    self.emit(SessionEvent::RegistrationFormCleared);
                }
            }
        }
    }

    fn apply_detection(
        &mut self,
        outcome: Option<crate::detection::domain::face_engine::FaceDetection>,
    ) {
        match outcome {
            Some(detection) => {
                let was_empty = self.descriptor.is_none();
                self.descriptor = Some(detection.descriptor.clone());
                self.emit(SessionEvent::DetectionChanged(Some(DetectionView::from(
                    &detection,
                ))));
                if was_empty && !self.trigger_pending && !self.checkin.is_in_flight() {
                    self.trigger = crossbeam_channel::after(self.config.auto_submit_delay);
                    self.trigger_pending = true;
                    self.emit(SessionEvent::AutoSubmitArmed);
                }
            }
            None => {
                if self.descriptor.take().is_some() {
                    self.emit(SessionEvent::DetectionChanged(None));
                }
                // A pending trigger never fires against a face that has
                // left the frame.
                self.cancel_trigger();
            }
        }
    }

    fn apply_still(&mut self, result: Result<StillScan, String>) {
        match result {
            Ok(scan) => {
                self.emit(SessionEvent::StillLoaded {
                    width: scan.width,
                    height: scan.height,
                });
                match scan.outcome {
                    Some(detection) => {
                        self.descriptor = Some(detection.descriptor.clone());
                        self.emit(SessionEvent::DetectionChanged(Some(DetectionView::from(
                            &detection,
                        ))));
                    }
                    None => {
                        self.descriptor = None;
                        self.emit(SessionEvent::DetectionChanged(None));
                    }
                }
            }
            Err(message) => {
                self.still_image = None;
                let lifecycle = self.checkin.fail_local(message);
                self.emit(SessionEvent::CheckIn(lifecycle));
            }
        }
    }

    fn stop_polling(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            log::debug!("stopping polling session {}", poller.generation());
            poller.stop();
        }
    }

    fn cancel_trigger(&mut self) {
        if self.trigger_pending {
            self.trigger = never();
            self.trigger_pending = false;
            self.emit(SessionEvent::AutoSubmitCancelled);
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Decode and scan an uploaded image; errors become user-facing messages.
fn scan_still(
    bytes: &[u8],
    engine: &Arc<Mutex<Box<dyn FaceEngine>>>,
) -> Result<StillScan, String> {
    let frame = still_image::decode(bytes).map_err(|e| {
        log::warn!("still decode failed: {e}");
        MSG_BAD_IMAGE.to_string()
    })?;
    let mut engine = engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    engine.ensure_ready().map_err(|e| e.to_string())?;
    let outcome = engine.detect(&frame).map_err(|e| e.to_string())?;
    Ok(StillScan {
        width: frame.width(),
        height: frame.height(),
        outcome,
    })
}
