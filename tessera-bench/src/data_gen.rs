//! Data generators for benchmarks

use fake::faker::address::en::CityName;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::FreeEmail;
use fake::faker::lorem::en::Paragraphs;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tessera::codec::SerializationMode;
use tessera::collection::{CollectionBuilder, CollectionDescriptor, IdStrategy};

/// Number of distinct cities; secondary index lookups return about `count / CITIES` documents.
pub const CITIES: usize = 16;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub city: String,
    pub age: i64,
    pub salary: f64,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// Generate one employee; the id doubles as the document id and keeps the email unique.
pub fn generate_employee(id: usize) -> Employee {
    let mut rng = rand::thread_rng();
    let email: String = FreeEmail().fake();
    Employee {
        id: id as i64,
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        email: format!("{}.{}", id, email),
        company: CompanyName().fake(),
        city: format!("city-{}", rng.gen_range(0..CITIES)),
        age: rng.gen_range(18..80),
        salary: rng.gen_range(30000.0..200000.0),
        active: rng.gen_bool(0.8),
    }
}

pub fn generate_employees(count: usize) -> Vec<Employee> {
    (0..count).map(generate_employee).collect()
}

/// Generate articles whose bodies span several store entries at the default entry limit.
pub fn generate_articles(count: usize, paragraphs: usize) -> Vec<Article> {
    (0..count)
        .map(|i| {
            let body: Vec<String> = Paragraphs(paragraphs..paragraphs + 1).fake();
            let city: String = CityName().fake();
            Article {
                id: i as i64,
                title: format!("{} #{}", city, i),
                body: body.join("\n\n").repeat(40),
            }
        })
        .collect()
}

/// Employees keyed by id, unique by email and grouped by city.
pub fn employee_descriptor() -> CollectionDescriptor<Employee> {
    CollectionBuilder::<Employee>::new("employees")
        .id_strategy(IdStrategy::derived(|e: &Employee| e.id))
        .primary_index("email", |e: &Employee| e.email.clone())
        .secondary_index("city", |e: &Employee| e.city.clone())
        .build()
        .unwrap_or_else(|e| panic!("invalid employee collection: {}", e))
}

pub fn article_descriptor() -> CollectionDescriptor<Article> {
    CollectionBuilder::<Article>::new("articles")
        .id_strategy(IdStrategy::derived(|a: &Article| a.id))
        .serialization(SerializationMode::Binary)
        .build()
        .unwrap_or_else(|e| panic!("invalid article collection: {}", e))
}
