pub mod chat_llm;
pub mod db;
pub mod external_db;
pub mod sql;

pub use chat_llm::OpenAiChatAdapter;
pub use db::DbAdapter;
pub use external_db::PgExternalConnector;
