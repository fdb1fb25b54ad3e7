mod handlers;

pub use handlers::{router, run_http};
