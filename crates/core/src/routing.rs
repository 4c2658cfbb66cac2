//! Probabilistic routing trees.

use queuesim_rng::Stream;
use queuesim_types::{ConfigError, StationId};

/// Where a station sends an entity after service.
///
/// A branch draws one uniform on the routing stream and takes its first
/// edge when the draw is at most `probability`. Nested branches draw only
/// when reached, so a chain like success / dropout / resubmission path
/// draws each probability conditionally on the previous outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Always go to this station.
    To(StationId),
    /// Bernoulli choice between two sub-routes.
    Branch {
        probability: f64,
        taken: Box<Route>,
        otherwise: Box<Route>,
    },
}

impl Route {
    /// Unconditional route.
    pub fn to(station: StationId) -> Self {
        Route::To(station)
    }

    /// Bernoulli branch with a validated probability.
    pub fn branch(
        field: &'static str,
        probability: f64,
        taken: Route,
        otherwise: Route,
    ) -> Result<Self, ConfigError> {
        ConfigError::check_probability(field, probability)?;
        Ok(Route::Branch {
            probability,
            taken: Box::new(taken),
            otherwise: Box::new(otherwise),
        })
    }

    /// Pick the next station.
    pub fn resolve(&self, stream: &mut Stream<'_>) -> StationId {
        let mut route = self;
        loop {
            match route {
                Route::To(station) => return *station,
                Route::Branch {
                    probability,
                    taken,
                    otherwise,
                } => {
                    route = if stream.bernoulli(*probability) {
                        taken
                    } else {
                        otherwise
                    };
                }
            }
        }
    }

    /// Every station this route can lead to.
    pub fn targets(&self) -> Vec<StationId> {
        match self {
            Route::To(station) => vec![*station],
            Route::Branch {
                taken, otherwise, ..
            } => {
                let mut targets = taken.targets();
                for t in otherwise.targets() {
                    if !targets.contains(&t) {
                        targets.push(t);
                    }
                }
                targets
            }
        }
    }
}
