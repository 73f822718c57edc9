pub mod business;
pub mod filter;
pub mod history;
pub mod result;
pub mod suggestion;

pub use business::{Business, BusinessId, Coordinates};
pub use filter::{FilterUpdate, SearchFilter, SortBy, SortOrder};
pub use history::HistoryItem;
pub use result::{MatchField, SearchResult};
pub use suggestion::{SearchSuggestion, SuggestionKind, SuggestionPayload};
