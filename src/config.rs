use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/pokemon";
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub base_url: String,
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: concat!("pokedex-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl BrowserConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// First listing URL: the base URL with the page size as `limit`.
    pub fn start_url(&self) -> Result<String, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        let limit = self.page_size.to_string();
        let url = Url::parse_with_params(&self.base_url, &[("limit", limit.as_str())]).map_err(
            |source| ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                source,
            },
        )?;
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_start_url_uses_fifty_per_page() {
        let url = BrowserConfig::default().start_url().unwrap();
        assert_eq!(url, "https://pokeapi.co/api/v2/pokemon?limit=50");
    }

    #[test]
    fn custom_page_size_and_base() {
        let url = BrowserConfig::default()
            .with_base_url("http://127.0.0.1:9000/api/v2/pokemon")
            .with_page_size(3)
            .start_url()
            .unwrap();
        assert_eq!(url, "http://127.0.0.1:9000/api/v2/pokemon?limit=3");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = BrowserConfig::default().with_page_size(0).start_url();
        assert!(matches!(err, Err(ConfigError::ZeroPageSize)));
    }

    #[test]
    fn relative_base_is_rejected() {
        let err = BrowserConfig::default()
            .with_base_url("pokemon")
            .start_url()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }
}
