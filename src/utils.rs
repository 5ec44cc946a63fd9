use core::convert::Infallible;

/// Unwrap results of driver calls that cannot fail
///
/// HAL traits return `Result<_, Infallible>` for operations such as reading a GPIO
/// or enabling the CAN peripheral; this avoids `unwrap()` on those.
pub trait InfallibleResult<T> {
    fn infallible(self) -> T;
}

impl<T> InfallibleResult<T> for Result<T, Infallible> {
    fn infallible(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => match e {},
        }
    }
}
