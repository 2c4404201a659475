/*!
    implement the host side of the servo bus, in any environment

    The central resource is the [Host] struct which owns the bus transport and the direction pin, and performs every exchange. Each command is one blocking exchange: the command is sent, then the answer is read with the transport's timeout.

    commands by family:

    - position and volatile parameters, in [accessing]
    - persistent configuration, in [eeprom]
    - id commands and liveness probe, in [probing]

    exchanges are serialized by `&mut self`, callers sharing a bus between tasks must wrap the [Host] in their own mutex.
*/

/// implementation of the bus exchanges
mod networking;
/// position commands and volatile parameters
pub mod accessing;
/// read and write the persistent configuration
pub mod eeprom;
/// single servo id commands and liveness probe
pub mod probing;


pub use networking::*;
pub use probing::ALIVE_PROBES;
