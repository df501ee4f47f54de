pub mod html_parser;

pub use html_parser::html_to_plain_text;
