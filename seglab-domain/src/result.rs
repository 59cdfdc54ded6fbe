use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};
use tracing::{error, warn};

/// Error type used across the annotation engine. Carries a message only,
/// errors are reported to the user or logged, not matched on.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct SlError {
    msg: String,
}
impl SlError {
    pub fn new(msg: &str) -> SlError {
        SlError {
            msg: msg.to_string(),
        }
    }
    pub fn msg(&self) -> &str {
        &self.msg
    }
}
impl Display for SlError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}
impl Error for SlError {}
impl From<&str> for SlError {
    fn from(value: &str) -> Self {
        SlError::new(value)
    }
}

/// The engine's result type with [`SlError`](SlError) as error type.
pub type SlResult<U> = Result<U, SlError>;

pub fn to_sl<E>(e: E) -> SlError
where
    E: Debug,
{
    SlError::new(&format!("{e:?}"))
}

pub fn trace_ok_err<T, E>(x: Result<T, E>) -> Option<T>
where
    E: Debug,
{
    match x {
        Ok(x) => Some(x),
        Err(e) => {
            error!("{e:?}");
            None
        }
    }
}
pub fn trace_ok_warn<T, E>(x: Result<T, E>) -> Option<T>
where
    E: Debug,
{
    match x {
        Ok(x) => Some(x),
        Err(e) => {
            warn!("{e:?}");
            None
        }
    }
}

/// Creates an [`SlError`](SlError) with a formatted message.
/// ```rust
/// # use std::error::Error;
/// use seglab_domain::{slerr, result::SlError};
/// # fn main() -> Result<(), Box<dyn Error>> {
/// assert_eq!(slerr!("some error {}", 1), SlError::new(format!("some error {}", 1).as_str()));
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! slerr {
    ($s:literal) => {
        $crate::result::SlError::new(format!($s).as_str())
    };
    ($s:literal, $( $exps:expr ),*) => {
        $crate::result::SlError::new(format!($s, $($exps,)*).as_str())
    };
}
