use tessera::collection::Document;
use tessera::query::{between, filter_by, QueryOptions};
use tessera_int_test::test_util::{
    cleanup, create_test_context, create_test_context_with, fake_people, people_descriptor,
    run_test, Person,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_delete_all_across_batches() {
    run_test(
        || create_test_context_with(|builder| builder.batch_size(64)),
        |ctx| {
            let people = ctx.db().collection(&people_descriptor())?;
            people.add_many(fake_people(1_000))?;
            assert_eq!(people.count()?, 1_000);

            assert_eq!(people.delete_all()?, 1_000);
            assert_eq!(people.count()?, 0);
            assert_eq!(people.count_index_entries("email")?, 0);
            assert_eq!(people.count_index_entries("city")?, 0);
            assert!(people.get_many(&QueryOptions::new())?.is_empty());
            assert_eq!(ctx.db().wipe()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_many_with_filter_range_and_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let people = ctx.db().collection(&people_descriptor())?;
            people.add_many(fake_people(100))?;

            let odd = filter_by(|doc: &Document<Person>| {
                doc.value().handle.ends_with(['1', '3', '5', '7', '9'])
            });
            assert_eq!(people.delete_many(&odd.clone().limit(10))?, 10);
            assert_eq!(people.count()?, 90);
            assert_eq!(people.delete_many(&odd)?, 40);
            assert_eq!(people.count()?, 50);

            assert_eq!(people.delete_many(&between("p0000", "p0050"))?, 25);
            assert_eq!(people.count()?, 25);
            assert_eq!(people.count_index_entries("email")?, 25);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_database_level_bulk_operations() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let people = db.collection(&people_descriptor())?;
            let others = db.collection(
                &tessera_int_test::test_util::people_builder("others").build()?,
            )?;
            people.add_many(fake_people(10))?;
            others.add_many(fake_people(5))?;

            assert_eq!(db.list_collection_names()?, vec!["others", "people"]);
            assert_eq!(db.count_all()?, 15);
            assert_eq!(db.delete_all()?, 15);
            assert_eq!(people.count()?, 0);
            assert_eq!(others.count()?, 0);
            Ok(())
        },
        cleanup,
    )
}
