//! BlueZ profile registration over the system D-Bus.
//!
//! BlueZ 5 no longer accepts raw SDP records from clients; instead a process
//! registers a *profile* with `org.bluez.ProfileManager1` and passes the XML
//! record as an option.  BlueZ publishes it for as long as the profile stays
//! registered, which is also bounded by the lifetime of our bus connection,
//! so the connection is kept inside the registrar.

use std::collections::HashMap;

use tracing::debug;
use zbus::blocking::Connection;
use zbus::zvariant::{ObjectPath, Value};

use super::{HID_SERVICE_UUID, PROFILE_OBJECT_PATH};
use crate::application::service::{RegistrationError, ServiceRegistrar};

#[zbus::proxy(
    interface = "org.bluez.ProfileManager1",
    default_service = "org.bluez",
    default_path = "/org/bluez"
)]
trait ProfileManager1 {
    fn register_profile(
        &self,
        profile: &ObjectPath<'_>,
        uuid: &str,
        options: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;

    fn unregister_profile(&self, profile: &ObjectPath<'_>) -> zbus::Result<()>;
}

/// Registers the HID profile with the local BlueZ daemon.
#[derive(Default)]
pub struct BluezRegistrar {
    manager: Option<ProfileManager1ProxyBlocking<'static>>,
}

impl BluezRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    fn profile_path() -> Result<ObjectPath<'static>, RegistrationError> {
        ObjectPath::try_from(PROFILE_OBJECT_PATH).map_err(|e| RegistrationError::Rejected(e.to_string()))
    }
}

impl ServiceRegistrar for BluezRegistrar {
    fn register(&mut self, record: &str) -> Result<(), RegistrationError> {
        let connection =
            Connection::system().map_err(|e| RegistrationError::Unavailable(e.to_string()))?;
        let manager = ProfileManager1ProxyBlocking::new(&connection)
            .map_err(|e| RegistrationError::Unavailable(e.to_string()))?;

        let mut options = HashMap::new();
        options.insert("ServiceRecord", Value::from(record));
        options.insert("Role", Value::from("server"));
        options.insert("RequireAuthentication", Value::from(false));
        options.insert("RequireAuthorization", Value::from(false));

        let uuid = HID_SERVICE_UUID.to_string();
        manager
            .register_profile(&Self::profile_path()?, &uuid, options)
            .map_err(|e| RegistrationError::Rejected(e.to_string()))?;
        debug!(path = PROFILE_OBJECT_PATH, %uuid, "profile registered");

        self.manager = Some(manager);
        Ok(())
    }

    fn unregister(&mut self) -> Result<(), RegistrationError> {
        let Some(manager) = self.manager.take() else {
            return Ok(());
        };
        manager
            .unregister_profile(&Self::profile_path()?)
            .map_err(|e| RegistrationError::Unregister(e.to_string()))
    }
}
