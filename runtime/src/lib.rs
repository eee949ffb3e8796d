mod error;
mod serial;
mod session;

pub use error::{
    Closed,
    CorrelatorError,
};
pub use serial::{
    connect_serial,
    SerialSession,
};
pub use session::{
    ExchangeState,
    Expect,
    Session,
};
