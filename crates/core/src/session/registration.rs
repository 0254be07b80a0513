use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use thiserror::Error;

use crate::backend::domain::check_in_client::{BackendError, BackendVerdict, CheckInClient};
use crate::session::checkin::MSG_TRANSPORT;
use crate::session::lifecycle::RequestLifecycle;
use crate::session::updates::Update;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required.")]
    MissingName,
    #[error("Code is required.")]
    MissingCode,
    #[error("An image is required.")]
    MissingImage,
}

/// How a registration submission started (or didn't).
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RegistrationStart {
    Started,
    /// Failed validation locally; the form is preserved for correction.
    RefusedInvalid(ValidationError),
    RefusedBusy,
}

/// Enrolment flow: form state, local validation and its own request
/// lifecycle, fully independent of the capture mode.
pub(crate) struct RegistrationFlow {
    name: String,
    code: String,
    image: Option<Vec<u8>>,
    lifecycle: RequestLifecycle,
    client: Arc<dyn CheckInClient>,
}

impl RegistrationFlow {
    pub fn new(client: Arc<dyn CheckInClient>) -> Self {
        Self {
            name: String::new(),
            code: String::new(),
            image: None,
            lifecycle: RequestLifecycle::Idle,
            client,
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_code(&mut self, code: String) {
        self.code = code;
    }

    pub fn set_image(&mut self, bytes: Vec<u8>) {
        self.image = Some(bytes);
    }

    pub fn lifecycle(&self) -> &RequestLifecycle {
        &self.lifecycle
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.code.trim().is_empty() {
            return Err(ValidationError::MissingCode);
        }
        if self.image.is_none() {
            return Err(ValidationError::MissingImage);
        }
        Ok(())
    }

    /// Validate and start a submission on a worker thread. Validation
    /// failures never reach the network and keep the form intact.
    pub fn submit(&mut self, updates: &Sender<Update>) -> RegistrationStart {
        if self.lifecycle.is_in_flight() {
            log::debug!("registration refused: already in flight");
            return RegistrationStart::RefusedBusy;
        }
        if let Err(error) = self.validate() {
            self.lifecycle = RequestLifecycle::Failed {
                message: error.to_string(),
            };
            return RegistrationStart::RefusedInvalid(error);
        }

        self.lifecycle = RequestLifecycle::InFlight;
        let name = self.name.trim().to_string();
        let code = self.code.trim().to_string();
        let image = self.image.clone().unwrap_or_default();
        let client = self.client.clone();
        let updates = updates.clone();
        thread::spawn(move || {
            let result = client.register_image(&name, &code, &image);
            let _ = updates.send(Update::RegistrationSettled { result });
        });
        RegistrationStart::Started
    }

    /// Apply a settle result. Returns the lifecycle and whether the form
    /// was cleared (success only; failures keep it for resubmission).
    pub fn settle(
        &mut self,
        result: Result<BackendVerdict, BackendError>,
    ) -> (RequestLifecycle, bool) {
        let mut cleared = false;
        self.lifecycle = match result {
            Ok(BackendVerdict::Matched { name, .. }) => {
                cleared = true;
                RequestLifecycle::Succeeded {
                    message: format!("Registered {name}."),
                }
            }
            Ok(BackendVerdict::Accepted { message }) => {
                cleared = true;
                RequestLifecycle::Succeeded {
                    message: message.unwrap_or_else(|| "Registration complete.".to_string()),
                }
            }
            Ok(BackendVerdict::Rejected { message }) => RequestLifecycle::Failed {
                message: message
                    .unwrap_or_else(|| "Registration was not accepted.".to_string()),
            },
            Err(e) => {
                log::warn!("registration failed: {e}");
                RequestLifecycle::Failed {
                    message: MSG_TRANSPORT.to_string(),
                }
            }
        };
        if cleared {
            self.name.clear();
            self.code.clear();
            self.image = None;
        }
        (self.lifecycle.clone(), cleared)
    }
}
