use super::{Action, Error, Sign};

/// What the solver does after a single evaluation.
#[derive(Debug)]
pub(super) enum Decision {
    Continue(Sign),
    StopEarly,
    Error(Error),
}

impl Decision {
    /// Combines the observer action with the residual outcome.
    ///
    /// An observer action always wins over the residual, which is how a
    /// failed evaluation can be recovered.
    pub(super) fn new(action: Option<Action>, residual: Result<f64, Error>) -> Self {
        match (action, residual) {
            (Some(Action::Stop), _) => Decision::StopEarly,
            (Some(Action::Assume(sign)), _) => Decision::Continue(sign),
            (None, Ok(value)) => Decision::Continue(Sign::of(value)),
            (None, Err(error)) => Decision::Error(error),
        }
    }
}
