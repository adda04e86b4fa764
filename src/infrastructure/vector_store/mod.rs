mod in_memory;
mod qdrant;
mod supabase;

pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;
pub use supabase::SupabaseVectorStore;
