use std::fmt;

/// Closed set of failure kinds a network engine can report for an attempt.
///
/// Suppression is decided by membership of the kind in the configured set,
/// so engines classify their own error types into one of these variants via
/// [`ClassifyFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// The connection could not be established
    Connect,
    /// Establishing the connection exceeded the open timeout
    ConnectTimeout,
    /// Waiting for the response exceeded the read timeout
    ReadTimeout,
    /// The request could not be sent
    Request,
    /// The request or response body failed mid-transfer
    Body,
    /// The response body could not be decoded
    Decode,
    /// Redirect handling failed
    Redirect,
    /// The request could not be built
    Builder,
    /// Anything the engine could not classify
    Other,
}

impl FailureKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 9] = [
        Self::Connect,
        Self::ConnectTimeout,
        Self::ReadTimeout,
        Self::Request,
        Self::Body,
        Self::Decode,
        Self::Redirect,
        Self::Builder,
        Self::Other,
    ];

    /// Name used when rendering a failure as `"<Kind>: <message>"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connect => "ConnectError",
            Self::ConnectTimeout => "ConnectTimeout",
            Self::ReadTimeout => "ReadTimeout",
            Self::Request => "RequestError",
            Self::Body => "BodyError",
            Self::Decode => "DecodeError",
            Self::Redirect => "RedirectError",
            Self::Builder => "BuilderError",
            Self::Other => "TransportError",
        }
    }

    /// Whether the failure happened before any byte reached the server
    pub const fn is_connect(self) -> bool {
        matches!(self, Self::Connect | Self::ConnectTimeout)
    }

    /// Whether the failure is a timeout
    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::ConnectTimeout | Self::ReadTimeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps an engine error onto a [`FailureKind`].
pub trait ClassifyFailure {
    /// The kind of this failure
    fn failure_kind(&self) -> FailureKind;
}

impl ClassifyFailure for FailureKind {
    fn failure_kind(&self) -> FailureKind {
        *self
    }
}

impl<T: ClassifyFailure + ?Sized> ClassifyFailure for &T {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}

impl<T: ClassifyFailure + ?Sized> ClassifyFailure for Box<T> {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}
