//! Root-cause unwrapping shared by the classifiers.
//!
//! A wrapped error exposes its underlying cause through
//! [`std::error::Error::source`]. Both classifiers only ever look at the last
//! error in that chain, never at the wrappers in between.
//!
//! [`std::io::Error`] is special-cased: its `source()` skips over the payload
//! passed to `io::Error::new`, so the walk steps into that payload instead.

use std::error::Error;
use std::io;

/// Maximum number of `source()` hops followed before giving up.
pub const MAX_CAUSE_DEPTH: usize = 32;

/// Returns the root cause of `err`, following at most [`MAX_CAUSE_DEPTH`] hops.
///
/// An error without a source is its own root cause.
pub fn root_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    root_cause_within(err, MAX_CAUSE_DEPTH)
}

/// Returns the root cause of `err`, following at most `max_depth` hops.
///
/// When the chain is longer than `max_depth` (or loops back on itself) the
/// error reached after `max_depth` hops is returned.
pub fn root_cause_within<'a>(
    err: &'a (dyn Error + 'static),
    max_depth: usize,
) -> &'a (dyn Error + 'static) {
    let mut current = err;
    for _ in 0..max_depth {
        match next_cause(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

fn next_cause<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a (dyn Error + 'static)> {
    match err.downcast_ref::<io::Error>() {
        Some(io_err) => io_err.get_ref().map(|inner| inner as &(dyn Error + 'static)),
        None => err.source(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Leaf;

    impl fmt::Display for Leaf {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "leaf")
        }
    }

    impl Error for Leaf {}

    #[derive(Debug)]
    struct Wrap {
        depth: usize,
        inner: Box<dyn Error + 'static>,
    }

    impl fmt::Display for Wrap {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrap {}", self.depth)
        }
    }

    impl Error for Wrap {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(self.inner.as_ref())
        }
    }

    /// An error whose source is always itself.
    #[derive(Debug)]
    struct Ouroboros;

    impl fmt::Display for Ouroboros {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "ouroboros")
        }
    }

    impl Error for Ouroboros {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(self)
        }
    }

    fn chain(depth: usize) -> Box<dyn Error + 'static> {
        let leaf: Box<dyn Error + 'static> = Box::new(Leaf);
        (1..=depth).fold(leaf, |inner, depth| {
            Box::new(Wrap { depth, inner }) as Box<dyn Error + 'static>
        })
    }

    #[test]
    fn test_unwrapped_error_is_its_own_root() {
        let err = Leaf;
        assert_eq!(root_cause(&err).to_string(), "leaf");
    }

    #[test]
    fn test_follows_chain_to_leaf() {
        let err = chain(5);
        assert_eq!(err.to_string(), "wrap 5");
        assert_eq!(root_cause(err.as_ref()).to_string(), "leaf");
    }

    #[test]
    fn test_chain_at_depth_limit_reaches_leaf() {
        let err = chain(MAX_CAUSE_DEPTH);
        assert_eq!(root_cause(err.as_ref()).to_string(), "leaf");
    }

    #[test]
    fn test_chain_beyond_depth_limit_stops_early() {
        let err = chain(MAX_CAUSE_DEPTH + 3);
        assert_eq!(root_cause(err.as_ref()).to_string(), "wrap 3");
    }

    #[test]
    fn test_self_referential_source_terminates() {
        let err = Ouroboros;
        assert_eq!(root_cause(&err).to_string(), "ouroboros");
    }

    #[test]
    fn test_steps_into_io_error_payload() {
        let err = io::Error::new(io::ErrorKind::Other, Leaf);
        assert!(root_cause(&err).downcast_ref::<Leaf>().is_some());

        let wrapped = io::Error::new(
            io::ErrorKind::Other,
            io::Error::new(io::ErrorKind::Other, Leaf),
        );
        assert!(root_cause(&wrapped).downcast_ref::<Leaf>().is_some());
    }

    #[test]
    fn test_os_io_error_is_its_own_root() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        assert!(root_cause(&err).downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn test_zero_depth_returns_input() {
        let err = chain(2);
        assert_eq!(root_cause_within(err.as_ref(), 0).to_string(), "wrap 2");
    }
}
