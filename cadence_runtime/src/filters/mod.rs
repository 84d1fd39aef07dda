//! Online filters.
//!
//! All filters share the same surface: `put()` filters a value and (while
//! calibrating) learns from it, `step()` finalizes the statistics once per
//! tick, `reset()` re-seeds, and calibration can be paused without
//! stopping the filtering itself. Values supplied more than once between
//! steps are folded into a per-step average (see [`StepAggregate`]).

mod debounce;
mod min_max_scaler;
mod normalizer;
mod robust_scaler;
mod scaler;
mod smoother;
mod step_aggregate;

pub use debounce::{DebounceMode, DebouncedInput, Debouncer};
pub use min_max_scaler::MinMaxScaler;
pub use normalizer::Normalizer;
pub use robust_scaler::RobustScaler;
pub use scaler::Scaler;
pub use smoother::Smoother;
pub use step_aggregate::StepAggregate;
