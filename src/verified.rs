/// A value that passed a [`Sanitizer`](crate::Sanitizer).
///
/// There is no public constructor; sanitizers inside this crate are the only
/// producers, so holding a `Verified<i64>` proves the id was parsed and range
/// checked.
///
/// ```compile_fail
/// use tutordesk_auth::Verified;
///
/// let forged = Verified::new_unchecked(1_i64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the validated value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_ref_does_not_consume() {
        let id = Verified::new_unchecked(7_i64);
        assert_eq!(*id.as_ref(), 7);
        assert_eq!(id.into_inner(), 7);
    }
}
