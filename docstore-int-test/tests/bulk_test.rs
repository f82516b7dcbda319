use docstore::bulk::BulkLoaderOptions;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::field;
use docstore_int_test::test_util::{
    cleanup, create_bulk_test_context, create_test_context, run_test, Product,
};
use docstore::session::Entity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_bulk_load_all_retrievable() {
    run_test(
        create_bulk_test_context,
        |ctx| {
            let store = ctx.store();
            let count = 10_000;
            let mut loader = store.open_bulk_loader()?;
            let mut keys = Vec::with_capacity(count);
            for _ in 0..count {
                let product = Product::random(None);
                keys.push(loader.store(Product::collection_name(), product.to_document()?)?);
            }

            let statistics = loader.close()?;
            assert_eq!(statistics.documents_submitted(), count as u64);
            assert_eq!(statistics.documents_flushed(), count as u64);
            assert_eq!(statistics.chunks_flushed(), 100);
            assert_eq!(statistics.chunks_failed(), 0);

            assert_eq!(store.count("Products")?, count);
            assert_eq!(store.get_many(&keys)?.len(), count);
            assert_eq!(keys[0], "products/1-A");
            assert_eq!(keys[count - 1], format!("products/{}-A", count));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_readers_never_see_partial_chunks() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let chunk = 250;
            let done = Arc::new(AtomicBool::new(false));

            let reader = {
                let store = store.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut observed = 0;
                    while !done.load(Ordering::SeqCst) {
                        let count = store.count("Products").unwrap();
                        assert_eq!(count % chunk, 0);
                        observed = observed.max(count);
                    }
                    observed
                })
            };

            let mut loader = store.open_bulk_loader_with_options(
                BulkLoaderOptions::new().batch_size(chunk).queue_depth(1),
            )?;
            for i in 0..(chunk * 20) {
                loader.store("Products", doc! { n: i })?;
            }
            loader.close()?;
            done.store(true, Ordering::SeqCst);

            let observed = reader.join().unwrap();
            assert!(observed <= chunk * 20);
            assert_eq!(store.count("Products")?, chunk * 20);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_bulk_loaded_documents_are_queryable() {
    run_test(
        create_bulk_test_context,
        |ctx| {
            let store = ctx.store();
            let mut loader = store.open_bulk_loader()?;
            for i in 0..1_000 {
                loader.store("Products", doc! { UnitsInStock: (i % 20) })?;
            }
            loader.close()?;

            let in_range = store
                .query("Products")
                .filter(field("UnitsInStock").gt(5).and(field("UnitsInStock").lt(11)))
                .count()?;
            assert_eq!(in_range, 250);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dropped_loader_keeps_flushed_chunks_only() {
    run_test(
        create_bulk_test_context,
        |ctx| {
            let store = ctx.store();
            {
                let mut loader = store.open_bulk_loader()?;
                for i in 0..250 {
                    loader.store("Products", doc! { n: i })?;
                }
            }
            assert_eq!(store.count("Products")?, 200);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_bulk_load_into_closed_store_reports_lost_keys() {
    run_test(
        create_bulk_test_context,
        |ctx| {
            let store = ctx.store();
            let mut loader = store.open_bulk_loader()?;
            let mut keys = Vec::new();
            for _ in 0..150 {
                keys.push(loader.store("Products", doc! { n: 1 })?);
            }
            store.close();
            for _ in 0..30 {
                keys.push(loader.store("Products", doc! { n: 1 })?);
            }

            let err = loader.close().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::BulkLoadError);
            // the first chunk may have landed before the store closed
            assert!(err.affected_keys().len() == 80 || err.affected_keys().len() == 180);
            assert_eq!(err.affected_keys().last(), keys.last());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_bulk_overwrites_existing_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let key = store.put("Products", None, doc! { Name: "Old" })?;

            let mut loader = store.open_bulk_loader()?;
            loader.store("Products", doc! { "_id": (key.clone()), Name: "New" })?;
            let generated = loader.store("Products", doc! { Name: "Other" })?;
            loader.close()?;

            assert_eq!(store.get(&key)?.get_str("Name"), Some("New"));
            assert_ne!(generated, key);
            Ok(())
        },
        cleanup,
    )
}
