use anyhow::Result;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use tracing::{debug, warn};

use crate::storage::Storage;
use crate::types::{ObjectDescriptor, SyncDecision, normalize_e_tag};

const NOT_FOUND_STATUS: u16 = 404;
const NOT_FOUND_CODES: [&str; 2] = ["NotFound", "NoSuchKey"];

/// Decides whether a source object has to be copied by looking at the destination.
pub struct ChangeDetector {
    target: Storage,
}

impl ChangeDetector {
    pub fn new(target: Storage) -> Self {
        Self { target }
    }

    pub async fn detect(&self, source_object: &ObjectDescriptor) -> Result<SyncDecision> {
        let key = source_object.key();

        let head_object_output = match self.target.head_object(key).await {
            Ok(output) => output,
            Err(e) if is_head_object_not_found_error(&e) => {
                debug!(key = key, "target object does not exist.");
                return Ok(SyncDecision::Absent);
            }
            Err(e) => {
                warn!(key = key, "failed to check the target object.");
                return Err(e);
            }
        };

        let decision = decide(
            source_object,
            head_object_output.content_length().unwrap_or_default(),
            head_object_output.e_tag().unwrap_or_default(),
        );

        debug!(
            key = key,
            source_size = source_object.size(),
            source_e_tag = source_object.e_tag(),
            copy_required = decision.is_copy_required(),
            "target object checked."
        );

        Ok(decision)
    }
}

/// An object is current only when both size and ETag match. ETags are compared
/// without their surrounding quotes.
pub fn decide(source_object: &ObjectDescriptor, target_size: i64, target_e_tag: &str) -> SyncDecision {
    if source_object.size() == target_size
        && normalize_e_tag(source_object.e_tag()) == normalize_e_tag(target_e_tag)
    {
        return SyncDecision::Current {
            target_size,
            target_e_tag: target_e_tag.to_string(),
        };
    }

    SyncDecision::Stale {
        target_size,
        target_e_tag: target_e_tag.to_string(),
    }
}

pub fn is_head_object_not_found_error(result: &anyhow::Error) -> bool {
    let Some(sdk_error) = result.downcast_ref::<SdkError<HeadObjectError, HttpResponse>>() else {
        return false;
    };

    if let Some(service_error) = sdk_error.as_service_error() {
        if service_error.is_not_found() {
            return true;
        }
        if service_error
            .code()
            .is_some_and(|code| NOT_FOUND_CODES.contains(&code))
        {
            return true;
        }
    }

    sdk_error
        .raw_response()
        .is_some_and(|response| response.status().as_u16() == NOT_FOUND_STATUS)
}
