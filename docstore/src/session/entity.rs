use crate::collection::Document;
use crate::errors::DocStoreResult;

/// A typed document that a [Session](crate::session::Session) can store and
/// load.
///
/// The id is the document key. An entity without an id gets a generated key
/// when stored, which is written back through [Entity::set_id].
///
/// ```rust
/// use docstore::collection::Document;
/// use docstore::errors::{DocStoreResult, DocStoreError, ErrorKind};
/// use docstore::session::Entity;
/// use docstore::doc;
///
/// #[derive(Default)]
/// struct Category {
///     id: Option<String>,
///     name: String,
/// }
///
/// impl Entity for Category {
///     fn collection_name() -> &'static str {
///         "Categories"
///     }
///
///     fn id(&self) -> Option<&str> {
///         self.id.as_deref()
///     }
///
///     fn set_id(&mut self, id: &str) {
///         self.id = Some(id.to_string());
///     }
///
///     fn to_document(&self) -> DocStoreResult<Document> {
///         Ok(doc! { Name: (self.name.clone()) })
///     }
///
///     fn from_document(document: &Document) -> DocStoreResult<Self> {
///         let name = document.get_str("Name").ok_or_else(|| {
///             DocStoreError::new("Category without a name", ErrorKind::ObjectMappingError)
///         })?;
///         Ok(Category {
///             id: document.key().map(String::from),
///             name: name.to_string(),
///         })
///     }
/// }
/// ```
pub trait Entity: Sized {
    fn collection_name() -> &'static str;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: &str);

    /// Maps the entity to a document body. Metadata fields are ignored.
    fn to_document(&self) -> DocStoreResult<Document>;

    fn from_document(document: &Document) -> DocStoreResult<Self>;
}
