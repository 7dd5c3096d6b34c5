use std::fmt::Display;

use tracing::{error, warn};

/// Log if the result is an error
pub trait Logged {
    fn log(self) -> Self;

    /// Log at `warn` level, for errors that are reported back to the user
    /// rather than failing the process
    fn log_warn(self) -> Self;
}

impl<T: Sized, E: Display> Logged for Result<T, E> {
    fn log(self) -> Self {
        if let Err(e) = &self {
            error!("{}", e);
        }
        self
    }

    fn log_warn(self) -> Self {
        if let Err(e) = &self {
            warn!("{}", e);
        }
        self
    }
}

/// Call a function by using the object as the receiver.
/// e.g. show some logs when a file has been loaded
pub trait Appliable
where
    Self: Sized,
{
    /// Call function that doesn't mutate the state of `self`
    fn then<F>(self, f: F) -> Self
    where
        F: FnOnce(&Self),
    {
        f(&self);
        self
    }
}

/// Every sized type can be applied
impl<T> Appliable for T where T: Sized {}
