pub mod extractor;

pub use extractor::{find_first_value, AlertFields, FieldExtractor, NOT_AVAILABLE};
