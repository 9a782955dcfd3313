use rundag::config::{ConfigFile, RawConfigFile, TargetConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Targets are kept in the order they are added.
    pub fn with_target(mut self, name: &str, target: TargetConfig) -> Self {
        self.config.target.insert(name.to_string(), target);
        self
    }

    pub fn with_default_target(mut self, name: &str) -> Self {
        self.config.config.default_target = Some(name.to_string());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.config.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TargetConfig`.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    /// A target without a command.
    pub fn new() -> Self {
        Self {
            target: TargetConfig::default(),
        }
    }

    pub fn cmd(cmd: &str) -> Self {
        let mut builder = Self::new();
        builder.target.cmd = Some(cmd.to_string());
        builder
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.target.after.push(dep.to_string());
        self
    }

    pub fn before(mut self, other: &str) -> Self {
        self.target.before.push(other.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.target.description = Some(text.to_string());
        self
    }

    pub fn produces(mut self, pattern: &str) -> Self {
        self.target.produces.push(pattern.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.target.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn on_success(mut self, cmd: &str) -> Self {
        self.target.on_success = Some(cmd.to_string());
        self
    }

    pub fn on_failure(mut self, cmd: &str) -> Self {
        self.target.on_failure = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}

impl Default for TargetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
