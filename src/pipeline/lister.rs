use anyhow::Result;
use tracing::{debug, trace};

use super::stage::Stage;
use crate::types::ObjectDescriptor;
use crate::types::error::S3mirrorError;

pub struct ObjectLister {
    base: Stage,
}

impl ObjectLister {
    pub fn new(base: Stage) -> Self {
        Self { base }
    }

    /// Lists the whole source bucket, following continuation tokens until the service
    /// stops returning one. Any failed page fails the listing as a whole.
    pub async fn list_source(&self, max_keys: i32) -> Result<Vec<ObjectDescriptor>> {
        trace!("list source objects has started.");

        let mut objects = Vec::new();
        let mut continuation_token = None;
        let mut page_count: u64 = 0;
        loop {
            if self.base.is_cancelled() {
                trace!("list_source() canceled.");
                return Err(S3mirrorError::Cancelled.into());
            }

            let list_objects_output = self
                .base
                .source
                .list_objects_page(continuation_token, max_keys)
                .await?;
            page_count += 1;

            for object in list_objects_output.contents() {
                objects.push(ObjectDescriptor::try_from(object)?);
            }

            debug!(
                page = page_count,
                listed = objects.len(),
                "source object page has been listed."
            );

            match list_objects_output.next_continuation_token() {
                Some(token) if !token.is_empty() => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        trace!("list source objects has been completed.");
        Ok(objects)
    }
}
