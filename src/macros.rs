// Logging shims, forwarded to `defmt` or `log` depending on enabled features.
// With neither enabled the arguments are still evaluated by reference so no
// unused-variable warnings leak out of the call sites.

macro_rules! debug {
    ($($e:expr),* $(,)?) => {
        #[cfg(feature = "log")]
        ::log::debug!($($e),*);
        #[cfg(feature = "defmt-03")]
        ::defmt::debug!($($e),*);
        #[cfg(not(any(feature = "log", feature = "defmt-03")))]
        {
            let _ = ($(&$e),*);
        }
    };
}

pub(crate) use debug;

macro_rules! warn_impl {
    ($($e:expr),* $(,)?) => {
        #[cfg(feature = "log")]
        ::log::warn!($($e),*);
        #[cfg(feature = "defmt-03")]
        ::defmt::warn!($($e),*);
        #[cfg(not(any(feature = "log", feature = "defmt-03")))]
        {
            let _ = ($(&$e),*);
        }
    };
}

pub(crate) use warn_impl as warn;
