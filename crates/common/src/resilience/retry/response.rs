/// The slice of a received response the retry guard needs to see.
///
/// Implementations must look headers up case-insensitively and return the
/// first value when a header is repeated.
pub trait ResponseView {
    /// Numeric HTTP status
    fn status_code(&self) -> u16;

    /// First value of the named header, if present
    fn header(&self, name: &str) -> Option<&str>;
}

impl<T: ResponseView + ?Sized> ResponseView for &T {
    fn status_code(&self) -> u16 {
        (**self).status_code()
    }

    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}

impl<T: ResponseView + ?Sized> ResponseView for Box<T> {
    fn status_code(&self) -> u16 {
        (**self).status_code()
    }

    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}
