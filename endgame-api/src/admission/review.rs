use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::error;

/// API version used when the request did not carry one.
pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";

/// Kind of both the request and the response envelope.
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// HTTP status code reported inside the response status of a denial.
const DENIED_STATUS_CODE: u16 = 403;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode admission review: {0}")]
    Json(#[from] serde_json::Error),

    #[error("admission review has no request")]
    MissingRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    /// Core group `v1` pods.
    pub fn pods() -> Self {
        Self {
            group: String::new(),
            version: "v1".to_string(),
            resource: "pods".to_string(),
        }
    }
}

/// The fields of an admission request the gate looks at.
///
/// Unknown fields (`userInfo`, `object`, `oldObject`, ...) are ignored: the pod
/// is always read fresh from the API server rather than trusted from the request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    #[serde(default)]
    pub kind: GroupVersionKind,
    pub resource: GroupVersionResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub dry_run: bool,
}

impl AdmissionRequest {
    /// Whether the request targets a namespaced core `v1` pod (and not one of
    /// its subresources).
    pub fn targets_namespaced_pod(&self) -> bool {
        self.resource == GroupVersionResource::pods()
            && self.sub_resource.as_deref().unwrap_or_default().is_empty()
            && !self.namespace.is_empty()
            && !self.name.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdmissionReviewIn {
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    request: Option<AdmissionRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdmissionReviewOut<'a> {
    api_version: &'a str,
    kind: &'static str,
    response: AdmissionResponse<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdmissionResponse<'a> {
    uid: &'a str,
    allowed: bool,
    status: ResponseStatus<'a>,
}

#[derive(Debug, Serialize)]
struct ResponseStatus<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
}

/// What a response has to echo back from the request it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewContext {
    pub uid: String,
    pub api_version: String,
}

impl Default for ReviewContext {
    /// Context used when the request could not be decoded at all.
    fn default() -> Self {
        Self {
            uid: String::new(),
            api_version: ADMISSION_API_VERSION.to_string(),
        }
    }
}

/// A decoded `AdmissionReview` request.
#[derive(Debug, Clone)]
pub struct DecodedReview {
    pub context: ReviewContext,
    pub request: AdmissionRequest,
}

/// The allow/deny answer for one admission call together with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionVerdict {
    pub allowed: bool,
    pub reason: String,
}

impl AdmissionVerdict {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        if self.allowed { "allow" } else { "deny" }
    }
}

/// Decodes an `AdmissionReview` request body.
pub fn decode_request(body: &[u8]) -> Result<DecodedReview, DecodeError> {
    let review: AdmissionReviewIn = serde_json::from_slice(body)?;
    let request = review.request.ok_or(DecodeError::MissingRequest)?;

    let context = ReviewContext {
        uid: request.uid.clone(),
        api_version: review
            .api_version
            .filter(|version| !version.is_empty())
            .unwrap_or_else(|| ADMISSION_API_VERSION.to_string()),
    };

    Ok(DecodedReview { context, request })
}

/// Encodes `verdict` as an `AdmissionReview` response answering `context`.
///
/// Serialization of these plain structs cannot realistically fail; if it ever
/// does the failure is logged and an empty body is returned.
pub fn encode_verdict(context: &ReviewContext, verdict: &AdmissionVerdict) -> Vec<u8> {
    let review = AdmissionReviewOut {
        api_version: &context.api_version,
        kind: ADMISSION_REVIEW_KIND,
        response: AdmissionResponse {
            uid: &context.uid,
            allowed: verdict.allowed,
            status: ResponseStatus {
                message: &verdict.reason,
                code: (!verdict.allowed).then_some(DENIED_STATUS_CODE),
            },
        },
    };

    match serde_json::to_vec(&review) {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, "failed to encode admission review response");
            Vec::new()
        }
    }
}

/// Turns any error into a deny verdict carrying the error message.
pub fn error_verdict<E>(err: &E) -> AdmissionVerdict
where
    E: fmt::Display + ?Sized,
{
    AdmissionVerdict::deny(err.to_string())
}
