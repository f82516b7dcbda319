use docstore::doc;
use docstore::errors::DocStoreResult;
use docstore::filter::field;
use docstore::index::IndexType;
use docstore_int_test::test_util::{cleanup, create_test_context};

fn main() -> DocStoreResult<()> {
    println!("Starting bulk load stress test...");
    let ctx = create_test_context()?;
    let store = ctx.store();

    let count = 2_000_000;
    let start = std::time::Instant::now();
    let mut loader = store.open_bulk_loader()?;
    for i in 0..count {
        loader.store(
            "Products",
            doc! {
                Name: (format!("Product #{}", i)),
                UnitsInStock: (i % 50),
                Supplier: (uuid::Uuid::new_v4().to_string()),
            },
        )?;
    }
    let statistics = loader.close()?;
    println!("Loaded {} in {:?}", statistics, start.elapsed());

    let start = std::time::Instant::now();
    let cursor = store
        .query("Products")
        .filter(field("UnitsInStock").gt(5).and(field("UnitsInStock").lt(11)))
        .order_by_descending("Name")
        .take(10)
        .execute()?;
    println!(
        "Scanned query in {:?}: {}",
        start.elapsed(),
        cursor.statistics()
    );

    let start = std::time::Instant::now();
    store.create_index("Products", "UnitsInStock", IndexType::Field)?;
    println!("Built index in {:?}", start.elapsed());

    let start = std::time::Instant::now();
    let matched = store
        .query("Products")
        .filter(field("UnitsInStock").eq(7))
        .count()?;
    println!("Counted {} products from the index in {:?}", matched, start.elapsed());

    println!("{}", store.statistics());
    cleanup(ctx)
}
