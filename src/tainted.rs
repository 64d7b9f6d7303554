use std::fmt;

/// A raw, caller-asserted value that has not been validated yet.
///
/// Header values such as the Telegram subject id or the claimed admin id
/// arrive as `Tainted<String>`. The only way to get at the value is through a
/// [`Sanitizer`](crate::Sanitizer), which turns it into a
/// [`Verified`](crate::Verified) value or rejects it.
///
/// # Examples
///
/// ```
/// use tutordesk_auth::{Sanitizer, SubjectIdSanitizer, Tainted};
///
/// let raw = Tainted::new(" 42 ".to_string());
/// let id = SubjectIdSanitizer.sanitize(raw).expect("numeric id");
/// assert_eq!(*id.as_ref(), 42);
/// ```
#[derive(Clone)]
pub struct Tainted<T> {
    // Must stay private: sanitizers are the only readers.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Hands the raw value to a sanitizer inside this crate.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted").field("inner", &self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_marks_value_as_tainted() {
        let raw = Tainted::new("618647337".to_string());
        let out = format!("{:?}", raw);
        assert!(out.contains("Tainted"));
        assert!(out.contains("618647337"));
    }

    #[test]
    fn clone_keeps_the_same_raw_value() {
        let a = Tainted::new("7".to_string());
        let b = a.clone();
        assert_eq!(a.into_inner(), b.into_inner());
    }
}
