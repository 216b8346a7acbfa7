pub mod ctc;
pub mod dart;

pub use ctc::{Ctc, CtcIntState};
pub use dart::{Dart, DartIntType, DartIrq, RxIntMode};
