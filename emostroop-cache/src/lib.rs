mod cache;

pub use cache::{Atom, FifoCache, get_text, intern_text, text_count};
