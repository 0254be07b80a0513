use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;

use crate::backend::domain::check_in_client::{BackendError, BackendVerdict, CheckInClient};
use crate::session::lifecycle::RequestLifecycle;
use crate::session::updates::Update;
use crate::shared::descriptor::Descriptor;

pub(crate) const MSG_NO_FACE: &str = "No face detected. Position your face and try again.";
pub(crate) const MSG_TRANSPORT: &str = "Connection error. Please try again.";
pub(crate) const MSG_REQUEST_INVALID: &str = "The request was not accepted.";

/// What a check-in submission carries to the backend.
#[derive(Debug)]
pub(crate) enum CheckInPayload {
    Descriptor(Descriptor),
    Image(Vec<u8>),
}

/// How a submission attempt started (or didn't).
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SubmitStart {
    Started,
    /// No descriptor and no image: failed locally, nothing was sent.
    RefusedNoPayload,
    /// A submission from this flow is already in flight.
    RefusedBusy,
}

/// Check-in request lifecycle: the in-flight guard, the worker spawn and
/// the verdict-to-message formatting live here; the controller decides
/// when to call it.
pub(crate) struct CheckInFlow {
    lifecycle: RequestLifecycle,
    client: Arc<dyn CheckInClient>,
}

impl CheckInFlow {
    pub fn new(client: Arc<dyn CheckInClient>) -> Self {
        Self {
            lifecycle: RequestLifecycle::Idle,
            client,
        }
    }

    pub fn lifecycle(&self) -> &RequestLifecycle {
        &self.lifecycle
    }

    pub fn is_in_flight(&self) -> bool {
        self.lifecycle.is_in_flight()
    }

    /// Back to `Idle`. Used on mode switches and explicit resets; a
    /// submission still in flight keeps running, its settle update is
    /// discarded by the controller's generation check.
    pub fn reset(&mut self) {
        self.lifecycle = RequestLifecycle::Idle;
    }

    /// Fail without contacting the backend (decode errors, empty buffer).
    pub fn fail_local(&mut self, message: impl Into<String>) -> RequestLifecycle {
        self.lifecycle = RequestLifecycle::Failed {
            message: message.into(),
        };
        self.lifecycle.clone()
    }

    /// Start a submission on a worker thread. Every worker exit path sends
    /// a `CheckInSettled` update, so the in-flight state cannot stick.
    pub fn submit(
        &mut self,
        generation: u64,
        payload: Option<CheckInPayload>,
        updates: &Sender<Update>,
    ) -> SubmitStart {
        if self.is_in_flight() {
            log::debug!("check-in refused: already in flight");
            return SubmitStart::RefusedBusy;
        }
        let Some(payload) = payload else {
            self.fail_local(MSG_NO_FACE);
            return SubmitStart::RefusedNoPayload;
        };

        self.lifecycle = RequestLifecycle::InFlight;
        let client = self.client.clone();
        let updates = updates.clone();
        thread::spawn(move || {
            let result = match payload {
                CheckInPayload::Descriptor(descriptor) => {
                    client.check_in_descriptor(&descriptor)
                }
                CheckInPayload::Image(bytes) => client.check_in_image(&bytes),
            };
            let _ = updates.send(Update::CheckInSettled { generation, result });
        });
        SubmitStart::Started
    }

    /// Apply a settle result, producing the user-visible lifecycle.
    pub fn settle(
        &mut self,
        result: Result<BackendVerdict, BackendError>,
    ) -> RequestLifecycle {
        self.lifecycle = match result {
            Ok(BackendVerdict::Matched { name, distance }) => RequestLifecycle::Succeeded {
                message: format!("Welcome, {name}! Match distance {distance}."),
            },
            Ok(BackendVerdict::Accepted { message }) => RequestLifecycle::Succeeded {
                message: message.unwrap_or_else(|| "Check-in succeeded.".to_string()),
            },
            Ok(BackendVerdict::Rejected { message }) => RequestLifecycle::Failed {
                message: message.unwrap_or_else(|| MSG_REQUEST_INVALID.to_string()),
            },
            Err(e) => {
                log::warn!("check-in failed: {e}");
                RequestLifecycle::Failed {
                    message: MSG_TRANSPORT.to_string(),
                }
            }
        };
        self.lifecycle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingClient {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CheckInClient for RecordingClient {
        fn check_in_descriptor(
            &self,
            _descriptor: &Descriptor,
        ) -> Result<BackendVerdict, BackendError> {
            self.calls.lock().unwrap().push("checkin_descriptor");
            Ok(BackendVerdict::Matched {
                name: "Alice".to_string(),
                distance: 0.32,
            })
        }

        fn check_in_image(&self, _image: &[u8]) -> Result<BackendVerdict, BackendError> {
            self.calls.lock().unwrap().push("checkin_image");
            Ok(BackendVerdict::Rejected { message: None })
        }

        fn register_image(
            &self,
            _name: &str,
            _code: &str,
            _image: &[u8],
        ) -> Result<BackendVerdict, BackendError> {
            self.calls.lock().unwrap().push("register_image");
            Ok(BackendVerdict::Accepted { message: None })
        }

        fn register_descriptor(
            &self,
            _name: &str,
            _code: &str,
            _descriptor: &Descriptor,
        ) -> Result<BackendVerdict, BackendError> {
            self.calls.lock().unwrap().push("register_descriptor");
            Ok(BackendVerdict::Accepted { message: None })
        }
    }

    #[test]
    fn test_empty_payload_fails_locally_without_network() {
        let client = RecordingClient::new();
        let mut flow = CheckInFlow::new(client.clone());
        let (tx, rx) = crossbeam_channel::unbounded();

        assert_eq!(flow.submit(1, None, &tx), SubmitStart::RefusedNoPayload);
        assert_eq!(
            flow.lifecycle(),
            &RequestLifecycle::Failed {
                message: MSG_NO_FACE.to_string()
            }
        );
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_submit_while_in_flight_is_refused() {
        let client = RecordingClient::new();
        let mut flow = CheckInFlow::new(client);
        let (tx, _rx) = crossbeam_channel::unbounded();

        let payload = || Some(CheckInPayload::Descriptor(Descriptor::new(vec![0.1; 4])));
        assert_eq!(flow.submit(1, payload(), &tx), SubmitStart::Started);
        assert_eq!(flow.submit(1, payload(), &tx), SubmitStart::RefusedBusy);
    }

    #[test]
    fn test_descriptor_submission_settles_with_update() {
        let client = RecordingClient::new();
        let mut flow = CheckInFlow::new(client.clone());
        let (tx, rx) = crossbeam_channel::unbounded();

        flow.submit(
            7,
            Some(CheckInPayload::Descriptor(Descriptor::new(vec![0.1; 4]))),
            &tx,
        );
        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            Update::CheckInSettled { generation, result } => {
                assert_eq!(generation, 7);
                let lifecycle = flow.settle(result);
                let message = lifecycle.message().unwrap();
                assert!(message.contains("Alice"));
                assert!(message.contains("0.32"));
            }
            other => panic!("expected CheckInSettled, got {other:?}"),
        }
        assert_eq!(client.calls(), vec!["checkin_descriptor"]);
    }

    #[test]
    fn test_rejection_message_is_verbatim() {
        let client = RecordingClient::new();
        let mut flow = CheckInFlow::new(client);
        let lifecycle = flow.settle(Ok(BackendVerdict::Rejected {
            message: Some("face not recognized".to_string()),
        }));
        assert_eq!(lifecycle.message(), Some("face not recognized"));
    }

    #[test]
    fn test_rejection_without_message_uses_fallback() {
        let client = RecordingClient::new();
        let mut flow = CheckInFlow::new(client);
        let lifecycle = flow.settle(Ok(BackendVerdict::Rejected { message: None }));
        assert_eq!(lifecycle.message(), Some(MSG_REQUEST_INVALID));
    }

    #[test]
    fn test_transport_failure_uses_generic_message_and_releases_flag() {
        let client = RecordingClient::new();
        let mut flow = CheckInFlow::new(client);
        let lifecycle = flow.settle(Err(BackendError::Transport(
            "connection refused".to_string(),
        )));
        assert_eq!(lifecycle.message(), Some(MSG_TRANSPORT));
        assert!(!flow.is_in_flight());
    }
}
