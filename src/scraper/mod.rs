pub mod http;
pub mod parser;

pub use http::{HttpClient, HttpClientBuilder};
pub use parser::{HtmlParser, JsonParser};
