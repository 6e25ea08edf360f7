use fake::faker::address::en::CityName;
use fake::faker::internet::en::FreeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::time::{Duration, Instant};
use std::{env, fs, thread};
use tessera::collection::{CollectionBuilder, CollectionDescriptor, IdStrategy};
use tessera::errors::TesseraResult;
use tessera::Tessera;

/// Runs `test` between `before` and `after`, retrying up to three times.
///
/// `after` runs even when the test fails so that on-disk stores are always removed. A panic
/// inside any of the closures counts as a failed attempt.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> TesseraResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> TesseraResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> TesseraResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_error = Some(e);
                last_backtrace = Some(bt);
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = Some(Backtrace::capture().to_string());
            }
        }

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("{}", last_error.as_deref().unwrap_or("Unknown"));
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    db: Tessera,
}

impl TestContext {
    pub fn new(path: String, db: Tessera) -> Self {
        Self { path, db }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn db(&self) -> Tessera {
        self.db.clone()
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir()
        .join(format!("tessera-it-{}", id))
        .to_string_lossy()
        .to_string()
}

#[cfg(all(feature = "fjall", not(feature = "memory")))]
pub fn create_test_context() -> TesseraResult<TestContext> {
    create_test_context_with(|builder| builder)
}

/// Opens a fresh database, letting `configure` adjust the builder before the store is attached.
#[cfg(all(feature = "fjall", not(feature = "memory")))]
pub fn create_test_context_with(
    configure: impl Fn(tessera::tessera_builder::TesseraBuilder) -> tessera::tessera_builder::TesseraBuilder,
) -> TesseraResult<TestContext> {
    use tessera_fjall_adapter::FjallModule;

    let path = random_path();
    if std::path::Path::new(&path).exists() {
        let _ = fs::remove_dir_all(&path);
    }

    let store = FjallModule::with_config()
        .db_path(&path)
        .low_memory_preset()
        .build()
        .open_store()?;
    let db = configure(Tessera::builder()).store(store).open()?;
    Ok(TestContext::new(path, db))
}

#[cfg(any(feature = "memory", not(feature = "fjall")))]
pub fn create_test_context() -> TesseraResult<TestContext> {
    create_test_context_with(|builder| builder)
}

#[cfg(any(feature = "memory", not(feature = "fjall")))]
pub fn create_test_context_with(
    configure: impl Fn(tessera::tessera_builder::TesseraBuilder) -> tessera::tessera_builder::TesseraBuilder,
) -> TesseraResult<TestContext> {
    let db = configure(Tessera::builder()).open()?;
    Ok(TestContext::new(random_path(), db))
}

/// Closes the database and removes its directory, retrying while file handles linger.
pub fn cleanup(ctx: TestContext) -> TesseraResult<()> {
    if let Err(e) = ctx.db().close() {
        eprintln!("Warning: Failed to close database: {:?}", e);
    }

    let path = ctx.path().to_string();
    let mut delay_ms = 50u64;
    for _ in 0..10 {
        if !std::path::Path::new(&path).exists() {
            return Ok(());
        }
        match fs::remove_dir_all(&path) {
            Ok(_) => return Ok(()),
            Err(_) => {
                thread::sleep(Duration::from_millis(delay_ms));
                delay_ms = (delay_ms * 2).min(1_000);
            }
        }
    }
    eprintln!("Warning: Could not remove test directory {}", path);
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub handle: String,
    pub name: String,
    pub email: String,
    pub city: String,
    pub bio: String,
}

impl Person {
    pub fn new(handle: &str, city: &str) -> Self {
        Person {
            handle: handle.to_string(),
            name: handle.to_string(),
            email: format!("{}@example.com", handle),
            city: city.to_string(),
            bio: String::new(),
        }
    }
}

/// `count` people with handles `p0000`, `p0001`, ... and random names and cities.
pub fn fake_people(count: usize) -> Vec<Person> {
    (0..count)
        .map(|i| {
            let email: String = FreeEmail().fake();
            Person {
                handle: format!("p{:04}", i),
                name: Name().fake(),
                email: format!("{}.{}", i, email),
                city: CityName().fake(),
                bio: Sentence(3..10).fake(),
            }
        })
        .collect()
}

/// People keyed by handle, unique by email and grouped by city.
pub fn people_descriptor() -> CollectionDescriptor<Person> {
    people_builder("people").build().unwrap_or_else(|e| panic!("{}", e))
}

pub fn people_builder(name: &str) -> CollectionBuilder<Person> {
    CollectionBuilder::<Person>::new(name)
        .id_strategy(IdStrategy::derived(|p: &Person| p.handle.clone()))
        .primary_index("email", |p: &Person| p.email.clone())
        .secondary_index("city", |p: &Person| p.city.clone())
}
