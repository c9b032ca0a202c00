pub mod client;
pub mod migrate;
pub mod reader;
pub mod writer;

pub use client::GraphClient;
pub use migrate::migrate;
pub use reader::GraphReader;
pub use writer::GraphWriter;
