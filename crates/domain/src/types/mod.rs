//! Request and response value types

pub mod encoder;
pub mod header;
pub mod header_list;
pub mod method;
pub mod request;
pub mod response;
pub mod sent_request;

pub use encoder::{default_json_encoder, JsonEncoder};
pub use header::{Header, KnownSensitiveHeaders, MaskFn};
pub use header_list::HeaderList;
pub use method::HttpMethod;
pub use request::{FilePart, Request, RequestBody};
pub use response::{is_success, Response};
pub use sent_request::SentRequest;
