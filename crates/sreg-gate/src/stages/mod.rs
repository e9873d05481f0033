pub mod immutable;
pub mod referential;
pub mod schema;
pub mod structural;

pub use immutable::ImmutableTypeStage;
pub use referential::ReferentialStage;
pub use schema::SchemaStage;
pub use structural::StructuralStage;
