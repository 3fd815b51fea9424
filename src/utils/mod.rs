pub mod date;
pub mod dtype;
pub mod headers;
pub mod retry;
pub mod text;

pub use date::{format_date, is_valid_date, parse_date, to_iso};
pub use dtype::{to_bool, to_date_iso, to_float, to_int, to_str, Truth};
pub use headers::{default_headers, random_user_agent};
pub use retry::{retry, retry_if, RetryPolicy};
pub use text::{clean_whitespace, is_empty, normalize, remove_special_chars, to_snake_case, truncate};
