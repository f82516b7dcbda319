use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// A named binary blob stored alongside a document.
///
/// Attachments are independent of the document's revision and are removed
/// when their document is deleted. The content is shared, so clones are
/// cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    content_type: String,
    hash: String,
    data: Arc<[u8]>,
}

impl Attachment {
    /// Reads `reader` to the end and captures its content.
    pub fn from_reader<R: Read>(name: &str, content_type: &str, mut reader: R) -> DocStoreResult<Self> {
        validate_attachment_name(name)?;

        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(|err| {
            log::error!("Failed to read attachment {}: {}", name, err);
            DocStoreError::new_with_cause(
                &format!("Failed to read attachment {}", name),
                ErrorKind::IOError,
                err.into(),
            )
        })?;
        Ok(Self::from_bytes(name, content_type, data))
    }

    pub(crate) fn from_bytes(name: &str, content_type: &str, data: Vec<u8>) -> Self {
        let hash = format!("{:x}", Sha256::digest(&data));
        Attachment {
            name: name.to_string(),
            content_type: content_type.to_string(),
            hash,
            data: Arc::from(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Hex encoded SHA-256 of the content.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a reader over the content.
    pub fn reader(&self) -> impl Read + '_ {
        Cursor::new(&self.data[..])
    }
}

impl Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .field("hash", &self.hash)
            .finish()
    }
}

pub(crate) fn validate_attachment_name(name: &str) -> DocStoreResult<()> {
    if name.trim().is_empty() {
        log::error!("Attachment name cannot be empty");
        return Err(DocStoreError::new(
            "Attachment name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}
