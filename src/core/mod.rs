//! Core modules for MindSpace

pub mod api;
pub mod crisis;
pub mod gateway;
pub mod render;
pub mod safety;
pub mod sentiment;
pub mod session;

pub use api::{create_router, run_server};
pub use crisis::{build_crisis_card, crisis_turn, CRISIS_HOTLINE};
pub use gateway::{parse_reply, ChatGateway, GeminiGateway, GenerateRequest};
pub use render::{TranscriptRenderer, TypingEffect};
pub use safety::SafetyFilter;
pub use sentiment::{extract, SentimentExtractor};
pub use session::{run_exchange, run_retry, ChatSession, ExchangeTicket, Submission};
