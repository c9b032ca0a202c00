pub mod claude;
mod schema;

pub use claude::Claude;
pub use schema::StructuredOutput;
