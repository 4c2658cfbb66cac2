//! Station arena construction.

use queuesim_core::Station;
use queuesim_stations::AnyStation;
use queuesim_types::{ConfigError, StationId};
use tracing::debug;

/// Builds the station arena.
///
/// Stations refer to each other by [`StationId`], so ids are reserved
/// first and stations installed afterwards, in any order. Cycles in the
/// routing graph are fine.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    names: Vec<String>,
    slots: Vec<Option<AnyStation>>,
}

impl NetworkBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id for a station named `name`.
    pub fn reserve(&mut self, name: impl Into<String>) -> StationId {
        let id = StationId(self.slots.len() as u32);
        self.names.push(name.into());
        self.slots.push(None);
        id
    }

    /// Install a station into its reserved slot.
    pub fn install(&mut self, station: impl Into<AnyStation>) -> Result<StationId, ConfigError> {
        let station = station.into();
        let id = station.id();
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or_else(|| ConfigError::UnknownStation(id.to_string()))?;
        if slot.is_some() {
            return Err(ConfigError::Invalid(format!(
                "station {} installed twice",
                station.name()
            )));
        }
        *slot = Some(station);
        Ok(id)
    }

    /// Reserve and install in one step, for stations built from their id.
    pub fn add<S, F>(&mut self, name: impl Into<String>, build: F) -> Result<StationId, ConfigError>
    where
        S: Into<AnyStation>,
        F: FnOnce(StationId) -> Result<S, ConfigError>,
    {
        let id = self.reserve(name);
        self.install(build(id)?)
    }

    /// Check wiring and return the arena.
    ///
    /// Fails if a reserved slot is empty or a station routes to a missing
    /// station or to a source.
    pub fn build(self) -> Result<Vec<AnyStation>, ConfigError> {
        let mut stations = Vec::with_capacity(self.slots.len());
        for (slot, name) in self.slots.into_iter().zip(&self.names) {
            stations.push(slot.ok_or_else(|| ConfigError::UnknownStation(name.clone()))?);
        }
        for station in &stations {
            for target in station.successors() {
                let accepts = stations
                    .get(target.index())
                    .is_some_and(AnyStation::accepts_entities);
                if !accepts {
                    return Err(ConfigError::UnknownStation(format!(
                        "{} routes to {target}, which cannot accept entities",
                        station.name()
                    )));
                }
            }
        }
        debug!(stations = stations.len(), "Built station arena");
        Ok(stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuesim_core::Route;
    use queuesim_rng::ServiceSampler;
    use queuesim_stations::{ServiceStation, ServiceStationConfig, TerminalSink};

    fn desk(id: StationId, to: StationId) -> Result<ServiceStation, ConfigError> {
        ServiceStation::new(
            id,
            ServiceStationConfig::new("Desk", ServiceSampler::exponential(1.0)?, Route::to(to)),
        )
    }

    #[test]
    fn test_forward_references_resolve() {
        let mut builder = NetworkBuilder::new();
        let end = builder.reserve("End");
        builder.add("Desk", |id| desk(id, end)).unwrap();
        builder.install(TerminalSink::new(end, "End")).unwrap();
        let stations = builder.build().unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name(), "End");
        assert_eq!(stations[1].name(), "Desk");
    }

    #[test]
    fn test_missing_slot_fails() {
        let mut builder = NetworkBuilder::new();
        let end = builder.reserve("End");
        builder.add("Desk", |id| desk(id, end)).unwrap();
        assert!(matches!(builder.build(), Err(ConfigError::UnknownStation(name)) if name == "End"));
    }

    #[test]
    fn test_dangling_route_fails() {
        let mut builder = NetworkBuilder::new();
        builder.add("Desk", |id| desk(id, StationId(7))).unwrap();
        assert!(builder.build().is_err());
    }
}
