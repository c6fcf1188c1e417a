//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。
//! 为兼容部署环境中既有的扁平环境变量（EMAIL、SMTP_SERVER、KAFKA_URL 等），
//! 在分层加载之后额外应用一轮显式覆盖。

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use crate::error::WelcomeError;

/// Kafka 配置
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
    pub consumer_group: String,
    pub auto_offset_reset: String,
    /// SASL/SCRAM 用户名，为空时使用明文连接（本地开发）
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "new-user".to_string(),
            consumer_group: "email-new-users".to_string(),
            auto_offset_reset: "earliest".to_string(),
            username: None,
            password: None,
        }
    }
}

/// SMTP 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    /// 发件人地址，同时作为 SMTP 认证用户名
    pub email: String,
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 587,
            email: "noreply@example.com".to_string(),
            password: String::new(),
        }
    }
}

/// 服务配置（存活探针 HTTP 端口）
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// 应用配置
///
/// 各分节带 `#[serde(default)]`：配置文件缺席时也能以默认值启动，
/// 再由环境变量覆盖。
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 环境变量（WELCOME_ 前缀，如 WELCOME_SMTP_SERVER -> smtp.server）
    /// 4. 部署环境既有的扁平环境变量（EMAIL、SMTP_SERVER、KAFKA_URL 等）
    pub fn load(service_name: &str) -> Result<Self, WelcomeError> {
        let env = std::env::var("WELCOME_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{env}.toml"))).required(false),
            )
            .add_source(
                Environment::with_prefix("WELCOME")
                    .separator("_")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_flat_env_overrides()?;

        Ok(config)
    }

    /// 应用部署环境既有的扁平环境变量覆盖
    ///
    /// 这些变量名来自运维侧既定约定，不带 WELCOME_ 前缀：
    /// - EMAIL / EMAIL_PASSWORD / SMTP_SERVER / SMTP_PORT -> smtp.*
    /// - KAFKA_URL（broker URL，提取 host:port）/ KAFKA_USERNAME / KAFKA_PASSWORD -> kafka.*
    /// - HTTP_PORT -> server.port（存活探针端口）
    fn apply_flat_env_overrides(&mut self) -> Result<(), WelcomeError> {
        if let Ok(v) = std::env::var("EMAIL") {
            self.smtp.email = v;
        }
        if let Ok(v) = std::env::var("EMAIL_PASSWORD") {
            self.smtp.password = v;
        }
        if let Ok(v) = std::env::var("SMTP_SERVER") {
            self.smtp.server = v;
        }
        if let Ok(v) = std::env::var("SMTP_PORT")
            && let Ok(port) = v.parse()
        {
            self.smtp.port = port;
        }
        if let Ok(v) = std::env::var("KAFKA_URL") {
            self.kafka.brokers = broker_from_url(&v)?;
        }
        if let Ok(v) = std::env::var("KAFKA_USERNAME") {
            self.kafka.username = Some(v);
        }
        if let Ok(v) = std::env::var("KAFKA_PASSWORD") {
            self.kafka.password = Some(v);
        }
        if let Ok(v) = std::env::var("HTTP_PORT")
            && let Ok(port) = v.parse()
        {
            self.server.port = port;
        }
        Ok(())
    }

    /// 获取存活探针监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// 从 broker URL 中提取 host:port
///
/// 托管 Kafka 服务下发的是带 scheme 的 URL（如 https://xxx.upstash.io:9092），
/// rdkafka 的 bootstrap.servers 只接受 host:port，端口缺省为 9092。
pub fn broker_from_url(url_str: &str) -> Result<String, WelcomeError> {
    let parsed = Url::parse(url_str)
        .map_err(|e| WelcomeError::Kafka(format!("解析 Kafka URL 失败: {e}")))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| WelcomeError::Kafka(format!("Kafka URL 缺少主机名: {url_str}")))?;
    let port = parsed.port().unwrap_or(9092);

    Ok(format!("{host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.kafka.topic, "new-user");
        assert_eq!(config.kafka.consumer_group, "email-new-users");
        assert_eq!(config.kafka.auto_offset_reset, "earliest");
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_broker_from_url_with_port() {
        let broker = broker_from_url("https://moved-mouse-1234.upstash.io:9092").unwrap();
        assert_eq!(broker, "moved-mouse-1234.upstash.io:9092");
    }

    #[test]
    fn test_broker_from_url_default_port() {
        // URL 未指定端口时缺省为 9092
        let broker = broker_from_url("kafka://broker.internal").unwrap();
        assert_eq!(broker, "broker.internal:9092");
    }

    #[test]
    fn test_broker_from_url_invalid() {
        assert!(broker_from_url("不是一个 URL").is_err());
    }
}
