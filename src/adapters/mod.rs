//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements         | Connects to                  |
//! |--------------|--------------------|------------------------------|
//! | `hardware`   | SignalPort         | embedded-hal input pins      |
//! |              | ActuatorPort       | embedded-hal output pins     |
//! | `sysfs`      | embedded-hal pins  | Linux sysfs GPIO (`sysfs`)   |
//! | `file_store` | ConfigPort         | `config.json`                |
//! |              | HistoryPort        | `history.json`               |
//! | `log_sink`   | EventSink          | `log` facade                 |
//! | `time`       | TimePort           | system clocks                |
//! | `signals`    | -                  | SIGINT / SIGTERM             |

pub mod file_store;
pub mod hardware;
pub mod log_sink;
pub mod signals;
#[cfg(feature = "sysfs")]
pub mod sysfs;
pub mod time;
