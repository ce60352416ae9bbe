//! Централизованная конфигурация для Construct Overlay
//!
//! Все дефолты слоя обмена сообщениями (окно истории, размер страницы,
//! лимит payload) определены здесь, а не захардкожены в `list`/`send`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Глобальная конфигурация приложения (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Размер страницы истории по умолчанию
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 10;

/// Окно истории по умолчанию: 7 дней
pub const DEFAULT_LIST_WINDOW_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Верхняя граница окна истории: 10 лет
pub const MAX_LIST_WINDOW_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Максимальный размер закодированного envelope по умолчанию: 1 MiB
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Целевое окружение сети
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    Local,
    #[default]
    Dev,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Dev => "dev",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

/// Основная структура конфигурации
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Окружение, в котором работает клиент
    pub env: Environment,

    // ============================================
    // ИСТОРИЯ (list)
    // ============================================

    /// Сколько сообщений запрашивать за одну страницу
    pub list_page_size: u32,

    /// Ширина окна истории, если `start_time` не задан (в секундах)
    pub list_window_seconds: i64,

    // ============================================
    // ОТПРАВКА (send)
    // ============================================

    /// Максимальный размер закодированного envelope (в байтах)
    pub max_payload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            list_window_seconds: DEFAULT_LIST_WINDOW_SECONDS,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

impl Config {
    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Переопределяем значения, если они заданы, парсятся и в допустимом диапазоне
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(parsed) = lookup("OVERLAY_ENV").and_then(|v| v.parse().ok()) {
            config.env = parsed;
        }

        if let Some(parsed) = lookup("OVERLAY_LIST_PAGE_SIZE")
            .and_then(|v| v.parse().ok())
            .filter(|size: &u32| *size > 0)
        {
            config.list_page_size = parsed;
        }

        if let Some(parsed) = lookup("OVERLAY_LIST_WINDOW_SECONDS")
            .and_then(|v| v.parse().ok())
            .filter(|seconds: &i64| (1..=MAX_LIST_WINDOW_SECONDS).contains(seconds))
        {
            config.list_window_seconds = parsed;
        }

        if let Some(parsed) = lookup("OVERLAY_MAX_PAYLOAD_SIZE")
            .and_then(|v| v.parse().ok())
            .filter(|size: &usize| *size > 0)
        {
            config.max_payload_size = parsed;
        }

        config
    }

    /// Получить глобальный экземпляр конфигурации
    ///
    /// Автоматически инициализирует конфигурацию со значениями по умолчанию при первом вызове
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию из переменных окружения
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_from_env() -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(Self::from_env())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию с кастомным экземпляром
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_with(config: Config) -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| "Config already initialized")
    }
}
