use std::panic::Location;

/// Fire-and-forget handling for transport calls whose failure must not
/// stop the quiz.
pub trait ResultExt<T> {
    fn log_err(self) -> Option<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Debug,
{
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = Location::caller();
                log::error!("{}:{}: {error:?}", caller.file(), caller.line());
                None
            }
        }
    }
}
