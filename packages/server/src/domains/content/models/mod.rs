pub mod content_library_result;
pub mod document_content;
pub mod extracted_link;
pub mod extraction_content;
pub mod markdown_content;

pub use content_library_result::*;
pub use document_content::*;
pub use extracted_link::*;
pub use extraction_content::*;
pub use markdown_content::*;
