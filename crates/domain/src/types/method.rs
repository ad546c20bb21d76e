//! HTTP methods

use serde::{Deserialize, Serialize};

use crate::impl_wire_token_conversions;

/// Methods a request can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Delete,
    Put,
    Patch,
    Post,
    Head,
    Options,
}

impl_wire_token_conversions!(HttpMethod {
    Get => "GET",
    Delete => "DELETE",
    Put => "PUT",
    Patch => "PATCH",
    Post => "POST",
    Head => "HEAD",
    Options => "OPTIONS",
});
