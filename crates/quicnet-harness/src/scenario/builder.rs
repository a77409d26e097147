//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use std::{io, time::Duration};

use quicnet_core::{Client, ClientConfig};
use quicnet_proto::Packet;

use super::{Observed, OracleFn, Outcome};
use crate::scripted::{ScriptedTransport, WireEvent};

/// Scenario builder.
///
/// Construct a scenario by describing the peer address and the wire script.
/// Must call `.oracle()` to get a [`RunnableScenario`] that can be executed.
pub struct Scenario {
    name: String,
    address: String,
    port: u16,
    config: ClientConfig,
    script: Vec<WireEvent>,
    async_deadline: Duration,
}

impl Scenario {
    /// Create a new scenario targeting `127.0.0.1:4433` with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: "127.0.0.1".to_string(),
            port: 4433,
            config: ClientConfig::default(),
            script: Vec::new(),
            async_deadline: Duration::from_millis(200),
        }
    }

    /// Target a different peer.
    pub fn peer(mut self, address: impl Into<String>, port: u16) -> Self {
        self.address = address.into();
        self.port = port;
        self
    }

    /// Client configuration used by both drivers.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a wire event.
    pub fn wire(mut self, event: WireEvent) -> Self {
        self.script.push(event);
        self
    }

    /// Append a reply packet.
    pub fn reply(self, packet: Packet) -> Self {
        self.wire(WireEvent::Reply(packet))
    }

    /// How long the async driver may stay suspended before the attempt is
    /// counted as timed out. Only [`WireEvent::Silence`] ever reaches it.
    pub fn async_deadline(mut self, deadline: Duration) -> Self {
        self.async_deadline = deadline;
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// 1. Runs the blocking driver against a fresh copy of the script
    /// 2. Runs the async driver on a current-thread runtime against another
    /// 3. Fails if the two disagree on outcome, binds or packets sent
    /// 4. Runs the oracle on the observation
    pub fn run(self) -> Result<Observed, String> {
        let name = &self.scenario.name;
        let blocking = self.run_blocking();
        let suspending = self.run_async()?;

        if blocking.outcome != suspending.outcome {
            return Err(format!(
                "Scenario '{name}': drivers disagree: blocking {:?}, async {:?}",
                blocking.outcome, suspending.outcome
            ));
        }
        if blocking.binds != suspending.binds || blocking.sent != suspending.sent {
            return Err(format!(
                "Scenario '{name}': drivers put different traffic on the wire \
                 (binds {} vs {}, packets {} vs {})",
                blocking.binds,
                suspending.binds,
                blocking.sent.len(),
                suspending.sent.len()
            ));
        }

        (self.oracle)(&blocking).map_err(|e| format!("Scenario '{name}': {e}"))?;
        Ok(blocking)
    }

    fn run_blocking(&self) -> Observed {
        let transport = ScriptedTransport::new(self.scenario.script.clone());
        let client = Client::with_transport(transport.clone(), self.scenario.config);

        let result = client.connect(&self.scenario.address, self.scenario.port);
        self.observe(&transport, Outcome::of(&result))
    }

    fn run_async(&self) -> Result<Observed, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| format!("Scenario '{}': runtime: {e}", self.scenario.name))?;

        let transport = ScriptedTransport::new(self.scenario.script.clone());
        let client = Client::with_transport(transport.clone(), self.scenario.config);

        let outcome = runtime.block_on(async {
            let attempt = client.connect_async(&self.scenario.address, self.scenario.port);
            match tokio::time::timeout(self.scenario.async_deadline, attempt).await {
                Ok(result) => Outcome::of(&result),
                Err(_) => Outcome::Io(io::ErrorKind::TimedOut),
            }
        });
        Ok(self.observe(&transport, outcome))
    }

    fn observe(&self, transport: &ScriptedTransport, outcome: Outcome) -> Observed {
        let log = transport.log();
        Observed {
            name: self.scenario.name.clone(),
            outcome,
            binds: log.binds(),
            peers: log.peers(),
            sent: log.sent(),
        }
    }
}
