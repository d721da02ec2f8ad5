//! Configuration
//!
//! Process configuration read from environment variables.

use crate::services::bridge::{
    BridgeSettings, ReconnectConfig, TelegramAdapterConfig, VkAdapterConfig,
};
use crate::utils::{AppError, AppResult};
use std::str::FromStr;

pub const TG_TOKEN: &str = "TG_TOKEN";
pub const VK_TOKEN: &str = "VK_TOKEN";
pub const TG_CHAT_ID: &str = "TG_CHAT_ID";
pub const VK_API_VERSION: &str = "VK_API_VERSION";
pub const VK_LONGPOLL_WAIT: &str = "VK_LONGPOLL_WAIT";
pub const BRIDGE_PAGE_SIZE: &str = "BRIDGE_PAGE_SIZE";
pub const BRIDGE_RELAY_OUTGOING: &str = "BRIDGE_RELAY_OUTGOING";
pub const TG_MAX_MESSAGE_LENGTH: &str = "TG_MAX_MESSAGE_LENGTH";

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub telegram: TelegramAdapterConfig,
    pub vk: VkAdapterConfig,
    pub bridge: BridgeSettings,
}

impl BridgeConfig {
    /// Load from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    ///
    /// Missing required variables and unparsable values are errors; unset
    /// optional variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| AppError::config(format!("{} is not set", key)))
        };

        let bot_token = required(TG_TOKEN)?;
        let access_token = required(VK_TOKEN)?;
        let control_chat_id: i64 = parse_value(TG_CHAT_ID, &required(TG_CHAT_ID)?)?;

        let telegram_defaults = TelegramAdapterConfig::default();
        let telegram = TelegramAdapterConfig {
            bot_token: Some(bot_token),
            control_chat_id,
            max_message_length: optional(&get, TG_MAX_MESSAGE_LENGTH)?
                .unwrap_or(telegram_defaults.max_message_length),
        };
        if telegram.max_message_length == 0 {
            return Err(AppError::config(format!(
                "{} must be at least 1",
                TG_MAX_MESSAGE_LENGTH
            )));
        }

        let vk_defaults = VkAdapterConfig::default();
        let vk = VkAdapterConfig {
            access_token: Some(access_token),
            api_version: get(VK_API_VERSION).unwrap_or(vk_defaults.api_version),
            api_base_url: vk_defaults.api_base_url,
            longpoll_wait_secs: optional(&get, VK_LONGPOLL_WAIT)?
                .unwrap_or(vk_defaults.longpoll_wait_secs),
        };

        let bridge_defaults = BridgeSettings::default();
        let page_size = optional(&get, BRIDGE_PAGE_SIZE)?.unwrap_or(bridge_defaults.page_size);
        if page_size == 0 {
            return Err(AppError::config(format!(
                "{} must be at least 1",
                BRIDGE_PAGE_SIZE
            )));
        }
        let relay_outgoing = match get(BRIDGE_RELAY_OUTGOING) {
            Some(value) => parse_bool(BRIDGE_RELAY_OUTGOING, &value)?,
            None => bridge_defaults.relay_outgoing,
        };

        Ok(Self {
            telegram,
            vk,
            bridge: BridgeSettings {
                page_size,
                relay_outgoing,
                reconnect: ReconnectConfig::default(),
            },
        })
    }
}

fn optional<T, G>(get: &G, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key).map(|value| parse_value(key, &value)).transpose()
}

fn parse_value<T>(key: &str, value: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| AppError::config(format!("{} has invalid value '{}': {}", key, value, e)))
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::config(format!(
            "{} has invalid value '{}': expected true or false",
            key, value
        ))),
    }
}
