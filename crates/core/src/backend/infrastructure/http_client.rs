use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;

use crate::backend::domain::check_in_client::{BackendError, BackendVerdict, CheckInClient};
use crate::shared::descriptor::Descriptor;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response body shared by all four endpoints. 2xx and 4xx responses both
/// carry it; anything else is off-contract.
#[derive(Deserialize)]
struct ApiResponse {
    success: bool,
    message: Option<String>,
    customer: Option<ApiCustomer>,
}

#[derive(Deserialize)]
struct ApiCustomer {
    name: String,
    distance: f64,
}

/// Multipart HTTP adapter for the verification service.
pub struct HttpCheckInClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HttpCheckInClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn post(&self, path: &str, form: Form) -> Result<BackendVerdict, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        interpret_response(status, &body)
    }
}

fn image_part(image: &[u8]) -> Result<Part, BackendError> {
    Part::bytes(image.to_vec())
        .file_name("image.jpg")
        .mime_str("image/jpeg")
        .map_err(|e| BackendError::Transport(e.to_string()))
}

fn descriptor_part(descriptor: &Descriptor) -> Part {
    Part::bytes(descriptor.to_wire_bytes()).file_name("descriptor.bin")
}

impl CheckInClient for HttpCheckInClient {
    fn check_in_descriptor(
        &self,
        descriptor: &Descriptor,
    ) -> Result<BackendVerdict, BackendError> {
        let form = Form::new().part("descriptor", descriptor_part(descriptor));
        self.post("/checkin/detection", form)
    }

    fn check_in_image(&self, image: &[u8]) -> Result<BackendVerdict, BackendError> {
        let form = Form::new().part("imageFile", image_part(image)?);
        self.post("/checkin", form)
    }

    fn register_image(
        &self,
        name: &str,
        code: &str,
        image: &[u8],
    ) -> Result<BackendVerdict, BackendError> {
        let form = Form::new()
            .text("name", name.to_string())
            .text("code", code.to_string())
            .part("imageFile", image_part(image)?);
        self.post("/register", form)
    }

    fn register_descriptor(
        &self,
        name: &str,
        code: &str,
        descriptor: &Descriptor,
    ) -> Result<BackendVerdict, BackendError> {
        let form = Form::new()
            .text("name", name.to_string())
            .text("code", code.to_string())
            .part("descriptor", descriptor_part(descriptor));
        self.post("/register/detection", form)
    }
}

/// Map an HTTP status + body to a verdict.
///
/// 2xx/4xx with the JSON contract are real answers (match or rejection);
/// 5xx and unparseable bodies mean the server never gave one.
fn interpret_response(status: u16, body: &str) -> Result<BackendVerdict, BackendError> {
    if status >= 500 {
        return Err(BackendError::Protocol(format!("http status {status}")));
    }
    let parsed: ApiResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::Protocol(format!("bad response body: {e}")))?;

    if parsed.success {
        Ok(match parsed.customer {
            Some(customer) => BackendVerdict::Matched {
                name: customer.name,
                distance: customer.distance,
            },
            None => BackendVerdict::Accepted {
                message: parsed.message,
            },
        })
    } else {
        Ok(BackendVerdict::Rejected {
            message: parsed.message,
        })
    }
}
