pub mod time;

pub use time::{Clock, Pacer, SystemClock, TokioPacer};
