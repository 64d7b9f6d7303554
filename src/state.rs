//! Type-state markers for context progression.
//!
//! Each state owns exactly what is known at that point of the resolution
//! walk: nothing, a resolved principal, or a principal that passed the
//! endpoint's role gate. None of them can be built outside this crate.

use crate::principal::Principal;

/// No credential has been resolved yet.
#[derive(Debug, Clone, Copy)]
pub struct Unauthed {
    _private: (),
}

impl Unauthed {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// A principal was resolved; its role has not been checked.
#[derive(Debug, Clone)]
pub struct Authed {
    pub(crate) principal: Principal,
}

/// The principal passed the role gate. Handlers only ever see this state.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub(crate) principal: Principal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthed_marker_is_zero_sized() {
        assert_eq!(std::mem::size_of::<Unauthed>(), 0);
        let _ = Unauthed::new();
    }
}
