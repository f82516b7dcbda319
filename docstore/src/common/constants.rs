// document metadata
pub const DOC_ID: &str = "_id";
pub const DOC_COLLECTION: &str = "_collection";
pub const DOC_REVISION: &str = "_revision";
pub const DOC_MODIFIED: &str = "_modified";
pub const RESERVED_FIELDS: [&str; 4] = [DOC_ID, DOC_COLLECTION, DOC_REVISION, DOC_MODIFIED];

pub const FIELD_SEPARATOR: &str = ".";

// key generation
pub const KEY_COLLECTION_SEPARATOR: char = '/';
pub const KEY_TAG_SEPARATOR: char = '-';
pub const MAX_KEY_LENGTH: usize = 512;
pub const DEFAULT_NODE_TAG: &str = "A";

// bulk loading
pub const DEFAULT_BULK_BATCH_SIZE: usize = 1024;
pub const DEFAULT_BULK_MAX_BUFFER_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_BULK_QUEUE_DEPTH: usize = 2;

// session
pub const DEFAULT_MAX_REQUESTS_PER_SESSION: u32 = 30;
