//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Only the API base URL can be overridden from the environment
//! (`AUTHGATE_BASE_URL`); everything else lives in the TOML file.

use navigation::{GuardConfig, RedirectStrategy, RouteDescriptor, RouteTable};
use serde::Deserialize;
use session_auth::{DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH};
use std::path::{Path, PathBuf};
use transport::HeaderInjection;

use auth_gateway::GatewayOptions;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteDescriptor>,
    #[serde(default)]
    pub headers: Vec<HeaderInjection>,
}

/// Backend API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where credentials are persisted between runs
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Route guard and login redirect settings
#[derive(Debug, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "default_login_route")]
    pub login_path: String,
    #[serde(default = "default_landing_route")]
    pub landing_path: String,
    #[serde(default)]
    pub redirect: RedirectStrategy,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_route(),
            landing_path: default_landing_route(),
            redirect: RedirectStrategy::default(),
        }
    }
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_store_path() -> PathBuf {
    PathBuf::from("authgate-session.json")
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_landing_route() -> String {
    "/".to_string()
}

fn default_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/", "home", "HomeView", false),
        RouteDescriptor::new("/about", "about", "AboutView", false),
        RouteDescriptor::new("/login", "login", "LoginView", false),
        RouteDescriptor::new("/users", "user-management", "UserManagementView", true),
        RouteDescriptor::new("/users/add", "add-user", "UserForm", true),
        RouteDescriptor::new("/users/:userId/edit", "edit-user", "UserForm", true),
        RouteDescriptor::new("/cardapio/categorias", "categoria-list", "CategoriaListView", true),
        RouteDescriptor::new("/cardapio/categorias/add", "add-categoria", "CategoriaForm", true),
        RouteDescriptor::new(
            "/cardapio/categorias/:categoriaId/edit",
            "edit-categoria",
            "CategoriaForm",
            true,
        ),
    ]
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(url) = std::env::var("AUTHGATE_BASE_URL") {
            config.api.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        for path in self
            .routes
            .iter()
            .map(|r| &r.path)
            .chain([&self.navigation.login_path, &self.navigation.landing_path])
        {
            if !path.starts_with('/') {
                return Err(common::Error::Config(format!(
                    "route paths must start with /, got: {path}"
                )));
            }
        }

        // Terminal failures redirect here; an unroutable login path would
        // leave the user wherever they were.
        let table = self.route_table();
        for (field, path) in [
            ("login_path", &self.navigation.login_path),
            ("landing_path", &self.navigation.landing_path),
        ] {
            match table.resolve(path) {
                None => {
                    return Err(common::Error::Config(format!(
                        "navigation.{field} {path} does not match any route"
                    )));
                }
                Some(route) if field == "login_path" && route.meta.requires_auth => {
                    return Err(common::Error::Config(format!(
                        "navigation.login_path {path} must not require authentication"
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_path {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("authgate.toml")
    }

    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(self.routes.clone())
    }

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            login_path: self.navigation.login_path.clone(),
            landing_path: self.navigation.landing_path.clone(),
        }
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            refresh_endpoint: self.api.refresh_path.clone(),
            login_endpoint: self.api.login_path.clone(),
            login_route: self.navigation.login_path.clone(),
            redirect: self.navigation.redirect,
            headers: self.headers.clone(),
        }
    }
}
