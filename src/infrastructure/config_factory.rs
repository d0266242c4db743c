use crate::core::interfaces::ConfigFactory;
use crate::core::models::{BuildEnvironment, BundlerConfig};
use crate::utils::Result;
use serde_json::Value;
use std::collections::HashMap;

/// Default mapping from a derived environment to engine configuration.
///
/// Production builds minify; development and debug-info builds carry source
/// maps. Free-form extras are flattened into the define map.
pub struct DefaultConfigFactory {
    out_dir: String,
}

impl DefaultConfigFactory {
    pub fn new() -> Self {
        Self {
            out_dir: "dist".to_string(),
        }
    }

    pub fn with_out_dir(out_dir: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl Default for DefaultConfigFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigFactory for DefaultConfigFactory {
    fn build_config(&self, env: &BuildEnvironment) -> Result<BundlerConfig> {
        let mut define = HashMap::new();
        define.insert("NODE_ENV".to_string(), env.mode.as_str().to_string());
        define.insert("PWA".to_string(), env.pwa.to_string());
        define.insert("POLYFILL".to_string(), env.polyfill.to_string());
        for (key, value) in &env.extra {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            define.insert(key.clone(), rendered);
        }

        Ok(BundlerConfig {
            root: env.project_root.clone(),
            out_dir: env.project_root.join(&self.out_dir),
            mode: env.mode,
            development: env.development,
            https: env.https,
            minify: env.production,
            sourcemap: env.development || env.debug_info,
            define,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::BuildMode;
    use serde_json::{json, Map};
    use std::path::PathBuf;

    fn environment(development: bool) -> BuildEnvironment {
        BuildEnvironment {
            project_root: PathBuf::from("/project/app"),
            mode: if development {
                BuildMode::Development
            } else {
                BuildMode::Production
            },
            development,
            production: !development,
            https: false,
            polyfill: false,
            pwa: true,
            debug_info: false,
            extra: Map::new(),
        }
    }

    #[test]
    fn production_minifies_and_skips_source_maps() {
        let config = DefaultConfigFactory::new()
            .build_config(&environment(false))
            .unwrap();
        assert!(config.minify);
        assert!(!config.sourcemap);
        assert_eq!(config.out_dir, PathBuf::from("/project/app/dist"));
    }

    #[test]
    fn extras_are_flattened_into_define() {
        let mut env = environment(true);
        env.extra.insert("publicPath".to_string(), json!("/assets/"));
        env.extra.insert("retries".to_string(), json!(3));

        let config = DefaultConfigFactory::new().build_config(&env).unwrap();
        assert_eq!(config.define.get("publicPath").unwrap(), "/assets/");
        assert_eq!(config.define.get("retries").unwrap(), "3");
        assert_eq!(config.define.get("NODE_ENV").unwrap(), "development");
    }
}
