use std::ops::Index;
use std::sync::Arc;
use tracing::{error, info, warn};
use crate::bus::BusAdapter;
use crate::config::DoorSettings;
use crate::controllers::{DoorCapabilities, ProvidedDoor};
use crate::errors::{DoorBusError, DoorBusResult};
use crate::models::{ObjectPath, RegistrationState};

/// Owns the doors created at startup, in argument order.
///
/// Doors are never removed once added; a door leaving the bus only changes its registration.
/// The position of a door in the registry is its stable identity.
pub struct DoorRegistry {
    doors: Vec<Arc<ProvidedDoor>>,
}

impl DoorRegistry {
    /// Creates one door per location and publishes it
    ///
    /// Locations that cannot be turned into a door, or whose door the bus refuses, are logged and
    /// left out; the remaining doors keep their argument order.
    ///
    /// # Arguments
    ///
    /// * `locations`: The door locations, in the order the operator gave them
    /// * `bus`: The bus every door is published on
    /// * `settings`: Initial state and path settings for the doors
    ///
    /// # Returns
    ///
    /// * `Ok(DoorRegistry)` with at least one published door
    /// * `Err(DoorBusError::NoDoorsAvailable)` if no door survived
    pub async fn bootstrap(
        locations: &[String],
        bus: Arc<dyn BusAdapter>,
        settings: &DoorSettings,
    ) -> DoorBusResult<Self> {
        let mut doors = Vec::with_capacity(locations.len());

        for (index, location) in locations.iter().enumerate() {
            let position = index + 1;
            let door = match ObjectPath::parse(&settings.path_for(location, position))
                .and_then(|path| ProvidedDoor::new(Arc::clone(&bus), location, settings.initially_open, path))
            {
                Ok(door) => door,
                Err(e) => {
                    error!("Failed to construct a door on location: {} properly: {}", location, e);
                    continue;
                }
            };

            if let Err(e) = door.publish().await {
                warn!("Failed to announce door existence at {}: {}", door.path(), e);
                continue;
            }
            doors.push(door);
        }

        if doors.is_empty() {
            error!("No doors available");
            return Err(DoorBusError::NoDoorsAvailable);
        }

        info!("{} of {} doors published", doors.len(), locations.len());
        Ok(Self { doors })
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<ProvidedDoor>> {
        self.doors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProvidedDoor>> {
        self.doors.iter()
    }

    pub fn locations(&self) -> Vec<&str> {
        self.doors.iter().map(|door| door.location()).collect()
    }

    /// Takes every registered door off the bus. Failures are logged and skipped.
    pub async fn retract_all(&self) {
        for door in &self.doors {
            if door.registration_state().await != RegistrationState::Registered {
                continue;
            }
            if let Err(e) = door.retract().await {
                error!("Failed to remove door @ {} from the bus: {}", door.location(), e);
            }
        }
    }
}

impl Index<usize> for DoorRegistry {
    type Output = Arc<ProvidedDoor>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.doors[index]
    }
}
