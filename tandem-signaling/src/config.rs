use std::time::Duration;
use tandem_core::IceServerConfig;

/// Settings handed to the connection engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub ice_candidate_pool_size: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::default()],
            ice_candidate_pool_size: 10,
        }
    }
}

/// Settings of one room session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    /// Bound on reaching `Connected` after create/join. `None` waits forever.
    pub connect_timeout: Option<Duration>,
    /// Capacity of the engine event and caller event channels.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            connect_timeout: Some(Duration::from_secs(30)),
            event_capacity: 256,
        }
    }
}

impl SessionConfig {
    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.engine.ice_servers = ice_servers;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
