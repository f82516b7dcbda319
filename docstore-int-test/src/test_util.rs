use docstore::collection::Document;
use docstore::common::Value;
use docstore::doc;
use docstore::errors::{DocStoreError, DocStoreResult, ErrorKind};
use docstore::session::Entity;
use docstore::{DocStore, DocStoreBuilder};
use fake::faker::company::en::{Buzzword, CompanyName};
use fake::Fake;
use rand::Rng;
use std::backtrace::Backtrace;
use std::time::Instant;

/// Runs `test` between `before` and `after`. `after` runs even when the
/// test fails, and a failure panics with the error and its elapsed time.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> DocStoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> DocStoreResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> DocStoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();
    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        let ctx = before().map_err(|e| (format!("Before run failed: {:?}", e), backtrace.to_string()))?;
        match test(ctx.clone()) {
            Ok(_) => after(ctx).map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
            Err(e) => {
                let _ = after(ctx);
                Err((format!("Test failed: {:?}", e), backtrace.to_string()))
            }
        }
    });

    let elapsed = start_time.elapsed();
    let (message, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err(failure)) => failure,
        Err(panic_err) => {
            let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", message), String::new())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", message);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");
    panic!("{}", message);
}

#[derive(Clone)]
pub struct TestContext {
    store: DocStore,
}

impl TestContext {
    pub fn new(store: DocStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> DocStore {
        self.store.clone()
    }
}

pub fn create_test_context() -> DocStoreResult<TestContext> {
    create_test_context_with(DocStoreBuilder::new())
}

/// Small bulk chunks so that tests exercise chunking and back-pressure.
pub fn create_bulk_test_context() -> DocStoreResult<TestContext> {
    create_test_context_with(
        DocStoreBuilder::new()
            .bulk_batch_size(100)
            .bulk_queue_depth(2),
    )
}

pub fn create_test_context_with(builder: DocStoreBuilder) -> DocStoreResult<TestContext> {
    Ok(TestContext::new(builder.open()?))
}

pub fn cleanup(ctx: TestContext) -> DocStoreResult<()> {
    ctx.store().close();
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
}

impl Category {
    pub fn new(name: &str) -> Self {
        Category {
            id: None,
            name: name.to_string(),
            description: Buzzword().fake(),
        }
    }
}

impl Entity for Category {
    fn collection_name() -> &'static str {
        "Categories"
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }

    fn to_document(&self) -> DocStoreResult<Document> {
        Ok(doc! {
            Name: (self.name.clone()),
            Description: (self.description.clone()),
        })
    }

    fn from_document(document: &Document) -> DocStoreResult<Self> {
        Ok(Category {
            id: document.key().map(String::from),
            name: required_str(document, "Name")?,
            description: document.get_str("Description").unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub id: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub supplier: String,
    pub units_in_stock: i64,
    pub price_per_unit: f64,
    pub discontinued: bool,
}

impl Product {
    pub fn new(name: &str, units_in_stock: i64) -> Self {
        Product {
            id: None,
            name: name.to_string(),
            category: None,
            supplier: CompanyName().fake(),
            units_in_stock,
            price_per_unit: 10.0,
            discontinued: false,
        }
    }

    /// A product with a fake supplier and random stock and price.
    pub fn random(category: Option<&str>) -> Self {
        let mut rng = rand::rng();
        Product {
            id: None,
            name: format!("Product #{}", rng.random_range(0..1_000_000)),
            category: category.map(String::from),
            supplier: CompanyName().fake(),
            units_in_stock: rng.random_range(0..50),
            price_per_unit: rng.random_range(1.0..500.0),
            discontinued: rng.random_bool(0.1),
        }
    }
}

impl Entity for Product {
    fn collection_name() -> &'static str {
        "Products"
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }

    fn to_document(&self) -> DocStoreResult<Document> {
        let mut document = doc! {
            Name: (self.name.clone()),
            Supplier: (self.supplier.clone()),
            UnitsInStock: (self.units_in_stock),
            PricePerUnit: (self.price_per_unit),
            Discontinued: (self.discontinued),
        };
        match &self.category {
            Some(category) => document.put("Category", category.as_str())?,
            None => document.put("Category", Value::Null)?,
        }
        Ok(document)
    }

    fn from_document(document: &Document) -> DocStoreResult<Self> {
        Ok(Product {
            id: document.key().map(String::from),
            name: required_str(document, "Name")?,
            category: document.get_str("Category").map(String::from),
            supplier: document.get_str("Supplier").unwrap_or_default().to_string(),
            units_in_stock: document
                .get("UnitsInStock")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            price_per_unit: document
                .get("PricePerUnit")
                .and_then(Value::as_f64)
                .unwrap_or_default(),
            discontinued: document
                .get("Discontinued")
                .and_then(Value::as_bool)
                .unwrap_or_default(),
        })
    }
}

fn required_str(document: &Document, field: &str) -> DocStoreResult<String> {
    match document.get_str(field) {
        Some(value) => Ok(value.to_string()),
        None => Err(DocStoreError::new(
            &format!("Document {:?} has no {} field", document.key(), field),
            ErrorKind::ObjectMappingError,
        )),
    }
}

/// Stores `count` products named `Product #999999` downwards, with stock
/// cycling through `0..12`, and returns their keys in insertion order.
pub fn seed_products(store: &DocStore, count: usize) -> DocStoreResult<Vec<String>> {
    let mut session = store.open_session();
    let mut keys = Vec::with_capacity(count);
    for i in 0..count {
        let mut product = Product::new(&format!("Product #{}", 999_999 - i), (i % 12) as i64);
        keys.push(session.store_entity(&mut product)?);
    }
    session.commit()?;
    Ok(keys)
}

#[ctor::ctor]
fn init() {
    colog::init();
}
