//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                    |
//! |-------------|---------------------|--------------------------------|
//! | `hardware`  | LiftMotor           | Step/dir driver via GPIO       |
//! |             | HallSensor          | ESP32 ADC1                     |
//! |             | BayMotors           | ESP32 LEDC (servo PWM)         |
//! |             | ScanPort, Clock     | Scanner channel, system timer  |
//! |             | Housekeeping        | Task watchdog                  |
//! | `log_sink`  | EventSink           | Serial log output              |
//! |             | StatusSink          | Serial log (display mirror)    |
//! | `nvs`       | ConfigSource        | NVS / in-memory store          |
//! |             | StoragePort         |                                |
//! | `rfid`      | ScanPort            | Scanner channel                |
//! | `time`      | Clock               | ESP32 system timer             |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod rfid;
pub mod time;
