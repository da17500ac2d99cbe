pub mod astra;
pub mod embeddings;
pub mod pinecone;
pub mod qdrant;
pub mod retriever;
pub mod vector;

pub use astra::AstraRetriever;
pub use embeddings::{Embedder, OpenAiEmbedder, TruncatedEmbedder};
pub use pinecone::PineconeRetriever;
pub use qdrant::QdrantRetriever;
pub use retriever::{Passage, RetrievalQuery, Retriever};
