use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Signaling server host, offered as the default on the connect prompt.
    pub address: String,
    pub port: u16,
    /// Display name other peers see.
    pub name: String,
    /// How long the transport waits for the server before reporting a failure.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfigBuilder::default().build()
    }
}

impl ClientConfig {
    pub fn sign_in_url(address: &str, port: u16) -> String {
        format!("ws://{}:{}/sign_in", address, port)
    }

    pub fn server_url(&self) -> String {
        Self::sign_in_url(&self.address, self.port)
    }
}

pub struct ClientConfigBuilder {
    pub address: String,
    pub port: u16,
    pub name: String,
    pub connect_timeout: Duration,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            name: "peer".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> ClientConfig {
        ClientConfig {
            address: self.address,
            port: self.port,
            name: self.name,
            connect_timeout: self.connect_timeout,
        }
    }

    pub fn address<S: AsRef<str>>(mut self, address: S) -> Self {
        self.address = address.as_ref().to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn name<S: AsRef<str>>(mut self, name: S) -> Self {
        self.name = name.as_ref().to_string();
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}
