//! Host specifics the portable `std` API does not cover.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub(crate) use self::unix::*;
    } else {
        mod fallback;
        pub(crate) use self::fallback::*;
    }
}
