//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                     | Connects to            |
//! |------------|--------------------------------|------------------------|
//! | `hardware` | DigitalIo                      | ESP32 GPIO             |
//! | `time`     | MonotonicClock, DelayNs        | esp_timer, Ets, FreeRTOS |
//! | `wifi`     | NetworkStack                   | ESP-IDF Wi-Fi STA      |
//! | `mqtt`     | SessionConnector, PubSubClient | esp-mqtt over mTLS     |
//! | `log_sink` | EventSink                      | Serial log output      |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
