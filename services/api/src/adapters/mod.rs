pub mod db;
pub mod generative_llm;
pub mod tts;

pub use db::DbAdapter;
pub use generative_llm::OpenAiGenerativeAdapter;
pub use tts::OpenAiTtsAdapter;
