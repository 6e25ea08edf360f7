use std::ops::ControlFlow;
use tessera::collection::Document;
use tessera::errors::TesseraResult;
use tessera::query::{filter_by, QueryOptions};
use tessera_int_test::test_util::{
    cleanup, create_test_context, fake_people, people_descriptor, Person,
};

fn main() -> TesseraResult<()> {
    colog::init();
    println!("Starting stress test...");
    let ctx = create_test_context()?;

    let count = 100_000;
    let people = ctx.db().collection(&people_descriptor())?;

    let start = std::time::Instant::now();
    for person in fake_people(count) {
        people.add(person)?;
    }
    println!("Inserted {} documents in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let mut pages = 0;
    let mut page = people.get_many(&QueryOptions::new().limit(1_000))?;
    loop {
        pages += 1;
        match page.cursor.take() {
            Some(cursor) => page = people.get_many(&QueryOptions::new().cursor(cursor).limit(1_000))?,
            None => break,
        }
    }
    println!("Walked {} pages in {:?}", pages, start.elapsed());

    let start = std::time::Instant::now();
    let mut streamed = 0;
    people.for_each(|_| {
        streamed += 1;
        Ok(ControlFlow::Continue(()))
    })?;
    println!("Streamed {} documents in {:?}", streamed, start.elapsed());

    let start = std::time::Instant::now();
    let removed = people.delete_many(&filter_by(|doc: &Document<Person>| doc.value().bio.len() % 2 == 0))?;
    println!("Deleted {} documents in {:?}", removed, start.elapsed());

    println!("Remaining: {}", people.count()?);
    cleanup(ctx)
}
