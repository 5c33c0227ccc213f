pub mod batch;
mod composer;
mod encoder;
pub mod handler;
pub mod types;

pub use batch::{BatchItem, BatchResult};
pub use handler::create_qr_router;
pub use types::{CorrectionLevel, EncodeRequest, OutputFormat, RenderOptions, build_encode_request};
