pub mod engine;
pub mod search;
pub mod sequence;
pub mod suggestions;

pub use engine::Engine;
pub use search::SearchService;
pub use sequence::{Debouncer, SequenceCounter};
pub use suggestions::SuggestionService;
