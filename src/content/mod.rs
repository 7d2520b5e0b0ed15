pub mod extractor;

pub use extractor::{extract_text, TextExtractor};
