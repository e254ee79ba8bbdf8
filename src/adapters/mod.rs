//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements            | Connects to                    |
//! |--------------|-----------------------|--------------------------------|
//! | `esp_uart`   | UartPort              | ESP-IDF UART driver            |
//! | `nvs`        | config persistence    | NVS / in-memory store          |
//! | `sd_card_fs` | SdCardPort            | FAT VFS mount / host directory |
//! | `sim_bridge` | UartPort, SdCardPort, | host simulator callbacks       |
//! |              | KeyboardPort          |                                |

#[cfg(target_os = "espidf")]
pub mod esp_uart;
pub mod nvs;
pub mod sd_card_fs;
pub mod sim_bridge;
pub(super) mod utils;
