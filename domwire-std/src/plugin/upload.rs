//! File uploads.

use domwire_core::{Error, Request, UploadManager, UploadedFile, request::UPLOAD_PARAM};
use std::{fmt, sync::Arc};
use tracing::debug;

/// Collects the files sent with a request.
///
/// Not part of the dispatch race: the request handler runs it before the
/// winning plugin when upload handling is enabled.
#[derive(Clone)]
pub struct UploadPlugin {
    manager: Arc<dyn UploadManager>,
}

impl fmt::Debug for UploadPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadPlugin").finish_non_exhaustive()
    }
}

impl UploadPlugin {
    /// Create a plugin backed by `manager`.
    pub fn new(manager: Arc<dyn UploadManager>) -> Self {
        Self { manager }
    }

    /// Returns `true` if the request carries files or references an upload.
    pub fn can_process_request(&self, request: &Request) -> bool {
        request.is_multipart() || request.param(UPLOAD_PARAM).is_some()
    }

    /// Ask the upload manager for the files of `request`.
    pub fn process(&self, request: &Request) -> Result<Vec<UploadedFile>, Error> {
        let files = self.manager.files_for_request(request).map_err(Error::from)?;
        debug!(count = files.len(), "files uploaded");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedUploads;

    #[test]
    fn test_claims_multipart_and_references() {
        let plugin = UploadPlugin::new(Arc::new(FixedUploads::new(vec![])));
        assert!(plugin.can_process_request(&Request::post().with_content_type("multipart/form-data")));
        assert!(plugin.can_process_request(&Request::post().with_param(UPLOAD_PARAM, "abc")));
        assert!(!plugin.can_process_request(&Request::post()));
    }

    #[test]
    fn test_process_returns_manager_files() {
        let plugin = UploadPlugin::new(Arc::new(FixedUploads::single("avatar", "me.png")));
        let files = plugin
            .process(&Request::post().with_content_type("multipart/form-data"))
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "me.png");
    }
}
