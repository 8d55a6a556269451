pub mod resolve;

pub use resolve::{extract_answers, Resolver};
