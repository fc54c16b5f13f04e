pub mod document_store;
pub use document_store::{Collection, Document, DocumentStore, SharedStore};
pub mod memory_store;
pub use memory_store::MemoryDocumentStore;
pub mod pg_store;
pub use pg_store::PgDocumentStore;

pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod target_repo;
pub use target_repo::TargetRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
